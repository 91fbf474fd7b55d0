// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-side error types.
//!
//! Every error offers `user_message()`, the single line shown to the tanod.

/// Failure reported by the device's position source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location information is unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Unknown location error: {0}")]
    Unknown(String),
}

impl GeolocationError {
    pub fn user_message(&self) -> String {
        match self {
            GeolocationError::PermissionDenied => {
                "Location access was denied. Allow location access to be tracked on patrol."
                    .to_string()
            }
            GeolocationError::PositionUnavailable => {
                "Your location is currently unavailable. Move to an open area and try again."
                    .to_string()
            }
            GeolocationError::Timeout => {
                "Getting your location took too long. Retrying.".to_string()
            }
            GeolocationError::Unknown(_) => {
                "An unknown error occurred while getting your location.".to_string()
            }
        }
    }
}

/// Errors from the API client, realtime channel and local log buffer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response. `code` is the server's machine-readable error.
    #[error("HTTP {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("Log buffer error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl ClientError {
    /// Server error code, for API errors.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            // Domain errors already carry an explanatory message
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ClientError::Geolocation(err) => err.user_message(),
            ClientError::Storage(_) => "Could not save patrol logs on this device.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geolocation_messages_are_distinct() {
        let messages: Vec<String> = [
            GeolocationError::PermissionDenied,
            GeolocationError::PositionUnavailable,
            GeolocationError::Timeout,
            GeolocationError::Unknown("boom".to_string()),
        ]
        .iter()
        .map(|e| ClientError::from(e.clone()).user_message())
        .collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_api_error_surfaces_server_message() {
        let err = ClientError::Api {
            status: 403,
            code: "outside_geofence".to_string(),
            message: "You must be inside the Purok 1 patrol area to start this patrol".to_string(),
        };
        assert_eq!(err.code(), Some("outside_geofence"));
        assert!(err.user_message().contains("Purok 1"));
    }
}
