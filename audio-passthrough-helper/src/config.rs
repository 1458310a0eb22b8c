use std::path::PathBuf;
use std::time::Duration;

/// `sun_path` is 104 bytes on macOS and 108 on Linux; stay under both.
const MAX_SOCKET_PATH_BYTES: usize = 103;

const SOCKET_FILE_NAME: &str = "audio-passthrough-helper.sock";

/// Where the helper listens, and how long a client waits for each reply.
///
/// The server never times out a request: it answers when the session does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperConfiguration {
    pub socket_path: PathBuf,
    pub reply_timeout: Duration,
}

impl Default for HelperConfiguration {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            reply_timeout: Duration::from_secs(5),
        }
    }
}

impl HelperConfiguration {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.socket_path.as_os_str().is_empty() {
            return Err("Socket path is empty".into());
        }
        let len = self.socket_path.as_os_str().len();
        if len > MAX_SOCKET_PATH_BYTES {
            return Err(format!(
                "Socket path is {} bytes, at most {} are supported",
                len, MAX_SOCKET_PATH_BYTES
            ));
        }
        if self.reply_timeout.is_zero() {
            return Err("Reply timeout must be positive".into());
        }
        Ok(())
    }
}

pub fn default_socket_path() -> PathBuf {
    std::env::temp_dir().join(SOCKET_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = HelperConfiguration::default();
        assert!(config.socket_path.ends_with(SOCKET_FILE_NAME));
        assert_eq!(config.reply_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_empty_path_and_zero_timeout() {
        let empty = HelperConfiguration {
            socket_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let instant = HelperConfiguration {
            socket_path: PathBuf::from("/tmp/h.sock"),
            reply_timeout: Duration::ZERO,
        };
        assert!(instant.validate().is_err());
    }

    #[test]
    fn rejects_overlong_socket_path() {
        let config = HelperConfiguration {
            socket_path: PathBuf::from(format!("/tmp/{}.sock", "x".repeat(120))),
            ..Default::default()
        };

        let err = config.validate().unwrap_err();

        assert!(err.contains("at most 103"));
    }
}
