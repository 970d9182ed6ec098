use chrono::Duration;

/// Token and password settings of the auth service.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Refresh lifetime when the login asked to be remembered.
    pub remember_ttl: Duration,
    pub reset_ttl: Duration,
    pub verify_ttl: Duration,
    pub bcrypt_cost: u32,
    pub password_pepper: Option<String>,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_issuer: "internship-core".to_string(),
            jwt_audience: "internship-portal".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            remember_ttl: Duration::days(30),
            reset_ttl: Duration::hours(1),
            verify_ttl: Duration::hours(24),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            password_pepper: None,
        }
    }
}

/// Schedules and retention of the background sweeps.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub overdue_interval: std::time::Duration,
    pub token_cleanup_interval: std::time::Duration,
    /// Tokens are deleted once expired for longer than this.
    pub token_cleanup_grace: Duration,
    pub audit_sweep_interval: std::time::Duration,
    pub audit_retention: Duration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            overdue_interval: std::time::Duration::from_secs(15 * 60),
            token_cleanup_interval: std::time::Duration::from_secs(60 * 60),
            token_cleanup_grace: Duration::days(1),
            audit_sweep_interval: std::time::Duration::from_secs(24 * 60 * 60),
            audit_retention: Duration::days(365),
        }
    }
}
