/// Failure of a single device call. Never aborts a multi-device operation;
/// these are collected per address into a [`crate::control::Summary`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("device offline: {0}")]
    Offline(String),

    #[error("device rejected request with status {0}")]
    Rejected(u16),

    #[error("failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<DeviceError>,
    },
}

impl DeviceError {
    pub fn error_type(&self) -> &'static str {
        match self {
            DeviceError::Offline(_) => "offline",
            DeviceError::Rejected(_) => "rejected",
            DeviceError::Exhausted { .. } => "exhausted",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Light '{0}' not found. Use 'keylight list' to see available lights.")]
    DeviceNotFound(String),

    #[error("{name}: {source}")]
    Device {
        name: String,
        #[source]
        source: DeviceError,
    },

    #[error("No lights configured. Please run: keylight detect")]
    NotConfigured,

    #[error("{0}")]
    NoTargets(String),

    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotConfigured => 2,
            AppError::DeviceNotFound(_) => 3,
            AppError::Device { .. } => 4,
            AppError::NoTargets(_) => 5,
            _ => 1,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::DeviceNotFound(_) => "device_not_found",
            AppError::Device { source, .. } => source.error_type(),
            AppError::NotConfigured => "not_configured",
            AppError::NoTargets(_) => "no_targets",
            AppError::Discovery(_) => "discovery",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Http(_) => "http",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "error": self.error_type(),
            "message": self.to_string(),
        });
        if let AppError::Device {
            source: DeviceError::Rejected(status),
            ..
        } = self
        {
            obj["status"] = serde_json::json!(status);
        }
        obj
    }
}
