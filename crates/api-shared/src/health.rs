use crate::HealthRes;

/// Health service backing the `/health` endpoint.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Reports the service as alive. No dependencies are checked; rendering problems surface
    /// on the generate endpoint instead.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "letterpdf is alive".into(),
        }
    }
}
