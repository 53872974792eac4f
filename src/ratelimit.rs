use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, time::Duration};

// Both origins are third-party sites that we have no agreement with,
// so stay well under anything that looks like hammering.
const REQ_PER_SEC: NonZeroU32 = nonzero!(4u32);
const MS_BETWEEN_REQ: Duration = Duration::from_millis(150);

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

pub struct RateLimiter {
    req_per_sec: SpecificGovernorRateLimiter,
    ms_between_req: SpecificGovernorRateLimiter,
}

impl RateLimiter {
    pub fn new() -> Self {
        // Limit to X total req/sec on average.
        let req_per_sec = GovernorRateLimiter::direct(Quota::per_second(REQ_PER_SEC));

        // Limit to Y req/ms (i.e. no two requests closer than Y ms).
        let ms_between_req =
            GovernorRateLimiter::direct(Quota::with_period(MS_BETWEEN_REQ).unwrap());

        RateLimiter {
            req_per_sec,
            ms_between_req,
        }
    }

    pub async fn wait_until_ready(&self) {
        // Await the coarse per-second quota before the fine spacing quota,
        // otherwise many callers can clear the spacing check and then cross
        // the per-second boundary together once it allows more flow.
        self.req_per_sec.until_ready().await;
        self.ms_between_req.until_ready().await;
    }
}
