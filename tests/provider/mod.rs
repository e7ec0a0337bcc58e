use std::sync::{Arc, Mutex};

use calendrical::{
    config::{self, Config},
    tz::{Diagnostic, Provider, TableProvider, TimeZone},
};

use crate::{write_zone_dir, zone_dir};

/// Europe/London resolves from a directory, and its offsets change at the
/// documented 2002 transitions.
#[test]
fn london_from_directory() -> anyhow::Result<()> {
    let (_dir, provider) = zone_dir()?;
    let london = provider.zone("Europe/London").unwrap();
    assert_eq!(london.id(), "Europe/London");
    // 2002-01-15T12:00:00Z and 2002-07-01T12:00:00Z
    assert_eq!(london.offset(1_011_096_000_000), 0);
    assert_eq!(london.offset(1_025_524_800_000), 3_600_000);
    assert_eq!(london.next_transition(1_011_096_000_000), 1_017_536_400_000);
    assert_eq!(london.next_transition(1_017_536_400_000), 1_035_680_400_000);
    Ok(())
}

/// An unknown identifier is just absent. Asking again changes nothing.
#[test]
fn unknown_zone_is_absent() -> anyhow::Result<()> {
    let (_dir, provider) = zone_dir()?;
    assert!(provider.zone("Not/AZone").is_none());
    assert!(provider.zone("Not/AZone").is_none());
    assert!(!provider.available_ids().contains("Not/AZone"));
    assert_eq!(provider.cache_stats().resident(), 0);
    // Known zones still load afterwards.
    assert!(provider.zone("Europe/Paris").is_some());
    Ok(())
}

#[test]
fn repeated_lookups_share_a_zone() -> anyhow::Result<()> {
    let (_dir, provider) = zone_dir()?;
    let first = provider.zone("America/New_York").unwrap();
    let second = provider.zone("us/eastern").unwrap();
    assert_eq!(first, second);
    assert_eq!(second.id(), "America/New_York");
    let stats = provider.cache_stats();
    assert_eq!(stats.resident(), 1);
    assert_eq!(stats.hits(), 1);
    assert_eq!(stats.misses(), 1);
    Ok(())
}

#[test]
fn available_ids() -> anyhow::Result<()> {
    let (_dir, provider) = zone_dir()?;
    let ids: Vec<String> = provider.available_ids().into_iter().collect();
    assert_eq!(
        ids,
        [
            "America/New_York",
            "Etc/UTC",
            "Europe/Jersey",
            "Europe/London",
            "Europe/Paris",
            "GB",
            "US/Eastern",
            "UTC",
        ],
    );
    assert!(provider.zone("etc/utc").unwrap().is_utc());
    Ok(())
}

/// Evicted zones come back from disk unchanged. If the file on disk
/// changes in the meantime, the zone is reported and dropped instead.
#[test]
fn eviction_and_reload() -> anyhow::Result<()> {
    let _ = env_logger::try_init();

    let dir = tempfile::tempdir()?;
    write_zone_dir(dir.path())?;
    let reports = Arc::new(Mutex::new(vec![]));
    let sink = Arc::clone(&reports);
    let provider = TableProvider::builder()
        .capacity(2)
        .diagnostic(Diagnostic::new(move |id, err| {
            sink.lock().unwrap().push((id.to_string(), err.to_string()));
        }))
        .build_from_dir(dir.path())?;

    let london = provider.zone("Europe/London").unwrap();
    provider.zone("Europe/Paris").unwrap();
    provider.zone("America/New_York").unwrap();
    assert_eq!(provider.cache_stats().evictions(), 1);
    assert_eq!(provider.zone("GB").unwrap(), london);

    std::fs::write(
        dir.path().join("europe-london.cztf"),
        std::fs::read(dir.path().join("europe-paris.cztf"))?,
    )?;
    provider.clear_cache();
    assert!(provider.zone("Europe/London").is_none());
    assert!(provider.zone("Europe/Jersey").is_none());
    assert!(provider.zone("Europe/Paris").is_some());

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1, "{reports:?}");
    assert_eq!(reports[0].0, "Europe/London");
    Ok(())
}

#[test]
fn missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err =
        TableProvider::from_dir(dir.path().join("nonexistent")).unwrap_err();
    assert!(err.is_zone_resource(), "{err}");
}

/// Lookups through `TimeZone` go through the process configuration. This
/// is the only test that replaces it.
#[test]
fn global_configuration() -> anyhow::Result<()> {
    let (_dir, provider) = zone_dir()?;
    let provider: Arc<dyn Provider> = Arc::new(provider);
    let paris = provider.zone("Europe/Paris").unwrap();
    config::set_global(
        Config::new(Arc::clone(&provider)).with_default_zone(paris.clone()),
    );

    assert_eq!(TimeZone::system(), paris);
    assert_eq!(TimeZone::get("gb")?.id(), "Europe/London");
    assert_eq!(TimeZone::get("+05:30")?.offset(0), 19_800_000);
    assert!(TimeZone::get("UTC")?.is_utc());
    let err = TimeZone::get("Not/AZone").unwrap_err();
    assert!(!err.is_zone_resource());
    assert!(Arc::ptr_eq(config::global().provider(), &provider));
    Ok(())
}
