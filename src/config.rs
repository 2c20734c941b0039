use std::env;

use crate::error::CollocError;

/// A user name and password for one of the archive servers.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new<S: Into<String>>(user: S, password: S) -> Self {
        Credentials {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Read `<PREFIX>_USER` and `<PREFIX>_PASSWORD` from the environment.
    ///
    /// A `.env` file in the working directory, or any of its parents, is loaded first if present.
    pub fn from_env(prefix: &str) -> Result<Self, CollocError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {:?}", path);
        }

        let var = |suffix: &str| {
            let key = format!("{}_{}", prefix, suffix);
            env::var(&key)
                .map_err(|_| CollocError::Format(format!("environment variable {} not set", key)))
        };

        Ok(Credentials {
            user: var("USER")?,
            password: var("PASSWORD")?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "Credentials({}, ****)", self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env() {
        env::set_var("SAT_COLLOC_TEST_USER", "alice");
        env::set_var("SAT_COLLOC_TEST_PASSWORD", "secret");

        let creds = Credentials::from_env("SAT_COLLOC_TEST").unwrap();
        assert_eq!(creds, Credentials::new("alice", "secret"));
    }

    #[test]
    fn test_missing_variable() {
        assert!(matches!(
            Credentials::from_env("SAT_COLLOC_UNSET"),
            Err(CollocError::Format(_))
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("alice", "secret");
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
