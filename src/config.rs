/*!
Process configuration: which provider resolves zone identifiers, and which
zone is the default.

Only [`Config::from_env`] reads the environment. The process-wide value
returned by [`global`] is built with it on first use, and can be replaced
at any time with [`set_global`].

# Initialization order

[`Config::from_env`] builds the provider first and then resolves the default
zone through it:

1. If `CALENDRICAL_TZDIR` is set, it names a directory with a provider index
and compiled zone tables, which becomes a [`TableProvider`]. If it isn't set,
or the directory's index can't be read, the provider is a [`UtcProvider`].
2. If `TZ` is set, it's looked up in that provider. A leading `:` is ignored.
If the provider doesn't know it, it's parsed as an offset identifier like
`+05:30`. If that fails too, or `TZ` isn't set, the default zone is UTC.

# Example

Tests and applications can build an isolated configuration directly:

```
use std::sync::Arc;

use calendrical::{config::Config, tz::{TimeZone, UtcProvider}};

let config = Config::new(Arc::new(UtcProvider))
    .with_default_zone(TimeZone::fixed(3_600_000)?);
assert_eq!(config.default_zone().id(), "+01:00");
assert!(config.zone("utc")?.is_utc());
assert!(config.zone("Europe/London").is_err());

# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

use std::{
    ffi::OsString,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use crate::{
    error::tz::zone::Error as ZoneError,
    tz::{self, Provider, TableProvider, TimeZone, UtcProvider},
    Error,
};

static GLOBAL: RwLock<Option<Arc<Config>>> = RwLock::new(None);

/// Returns the process-wide configuration.
///
/// The first call initializes it with [`Config::from_env`], unless
/// [`set_global`] was called first.
pub fn global() -> Arc<Config> {
    {
        let global = GLOBAL.read().unwrap_or_else(|err| err.into_inner());
        if let Some(ref config) = *global {
            return Arc::clone(config);
        }
    }
    let mut global = GLOBAL.write().unwrap_or_else(|err| err.into_inner());
    Arc::clone(global.get_or_insert_with(|| Arc::new(Config::from_env())))
}

/// Replaces the process-wide configuration.
///
/// Values already obtained from [`global`] are unaffected.
pub fn set_global(config: Config) {
    debug!(
        "replacing global configuration: default zone {}",
        config.default_zone.id(),
    );
    let mut global = GLOBAL.write().unwrap_or_else(|err| err.into_inner());
    *global = Some(Arc::new(config));
}

/// A zone provider together with a default time zone.
#[derive(Clone, Debug)]
pub struct Config {
    provider: Arc<dyn Provider>,
    default_zone: TimeZone,
}

impl Config {
    /// Returns a configuration using the given provider, with UTC as the
    /// default zone.
    pub fn new(provider: Arc<dyn Provider>) -> Config {
        Config { provider, default_zone: TimeZone::UTC }
    }

    /// Builds a configuration from the `CALENDRICAL_TZDIR` and `TZ`
    /// environment variables.
    ///
    /// This never fails. See the [module documentation](self) for how each
    /// variable is used and what happens when it's absent or unusable.
    pub fn from_env() -> Config {
        Config::from_vars(
            std::env::var_os("CALENDRICAL_TZDIR"),
            std::env::var_os("TZ"),
        )
    }

    fn from_vars(tzdir: Option<OsString>, tz: Option<OsString>) -> Config {
        let provider: Arc<dyn Provider> = match tzdir {
            None => {
                debug!("CALENDRICAL_TZDIR is not set, only UTC is available");
                Arc::new(UtcProvider)
            }
            Some(tzdir) => {
                let tzdir = PathBuf::from(tzdir);
                debug!("opening zone tables at {}", tzdir.display());
                match TableProvider::from_dir(&tzdir) {
                    Ok(provider) => Arc::new(provider),
                    Err(err) => {
                        warn!(
                            "failed opening CALENDRICAL_TZDIR={}, \
                             only UTC is available: {err}",
                            tzdir.display(),
                        );
                        Arc::new(UtcProvider)
                    }
                }
            }
        };
        let config = Config::new(provider);
        let Some(tz) = tz else {
            debug!("TZ is not set, using UTC as the default zone");
            return config;
        };
        let Some(tz) = tz.to_str() else {
            warn!("TZ={tz:?} is not valid UTF-8, using UTC as default zone");
            return config;
        };
        let id = tz.strip_prefix(':').unwrap_or(tz);
        match config.zone(id) {
            Ok(zone) => {
                debug!("using TZ={tz} as the default zone");
                config.with_default_zone(zone)
            }
            Err(err) => {
                warn!("using UTC as the default zone: {err}");
                config
            }
        }
    }

    /// Replaces the default zone.
    pub fn with_default_zone(self, default_zone: TimeZone) -> Config {
        Config { default_zone, ..self }
    }

    /// The provider used to resolve zone identifiers.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The default time zone.
    pub fn default_zone(&self) -> &TimeZone {
        &self.default_zone
    }

    /// Resolves a zone identifier through this configuration's provider,
    /// falling back to parsing it as an offset identifier.
    ///
    /// # Errors
    ///
    /// This returns an error when the identifier is neither known to the
    /// provider nor a valid offset identifier.
    pub fn zone(&self, id: &str) -> Result<TimeZone, Error> {
        if let Some(zone) = self.provider.zone(id) {
            return Ok(zone);
        }
        match tz::parse_offset_id(id) {
            Ok(offset) => TimeZone::fixed(offset),
            Err(_) => Err(ZoneError::not_found(id).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tz::testdata::ZoneTestFile;

    use super::*;

    fn tzdir() -> anyhow::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("index"),
            "zone Europe/London london.cztf\nlink GB Europe/London\n",
        )?;
        std::fs::write(
            dir.path().join("london.cztf"),
            ZoneTestFile::get("Europe/London").data,
        )?;
        Ok(dir)
    }

    #[test]
    fn nothing_set() {
        let config = Config::from_vars(None, None);
        assert!(config.default_zone().is_utc());
        assert!(config.zone("UTC").unwrap().is_utc());
        let err = config.zone("Europe/London").unwrap_err();
        assert!(!err.is_zone_resource());
        assert!(err.to_string().contains("Europe/London"), "{err}");
    }

    #[test]
    fn tzdir_and_tz() -> anyhow::Result<()> {
        let _ = env_logger::try_init();

        let dir = tzdir()?;
        let config = Config::from_vars(
            Some(dir.path().into()),
            Some(":gb".into()),
        );
        assert_eq!(config.default_zone().id(), "Europe/London");
        assert_eq!(
            config.provider().available_ids().into_iter().collect::<Vec<_>>(),
            ["Europe/London", "GB", "UTC"],
        );
        Ok(())
    }

    #[test]
    fn tz_as_offset() {
        let config = Config::from_vars(None, Some("-05:00".into()));
        assert_eq!(config.default_zone().offset(0), -18_000_000);
        assert_eq!(config.default_zone().id(), "-05:00");
    }

    #[test]
    fn unusable_values_fall_back() -> anyhow::Result<()> {
        let _ = env_logger::try_init();

        let missing = tempfile::tempdir()?;
        let config = Config::from_vars(
            Some(missing.path().into()),
            Some("Europe/London".into()),
        );
        assert!(config.default_zone().is_utc());
        assert_eq!(config.provider().available_ids().len(), 1);

        let dir = tzdir()?;
        let config = Config::from_vars(
            Some(dir.path().into()),
            Some("Not/AZone".into()),
        );
        assert!(config.default_zone().is_utc());
        Ok(())
    }
}
