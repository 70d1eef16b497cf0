// Client-side synchronization contract: idempotent snapshot application
// plus the polling fallback that bounds staleness when push delivery fails.

// Public API - what other modules can use
pub use cache::EventCache;
pub use poller::PollFallback;

// Internal modules
mod cache;
mod poller;
