use std::path::Path;

use calendrical::tz::{Provider, TableProvider, TimeZone};

mod chronology;
mod provider;
mod zone;

/// A type alias we use for tests.
type Result = std::result::Result<(), calendrical::Error>;

/// The compiled tables checked into the crate's test data, along with the
/// file name each one is stored under in a test zone directory.
const FIXTURES: &[(&str, &str, &[u8])] = &[
    (
        "America/New_York",
        "america-new-york.cztf",
        include_bytes!("../src/tz/testdata/america-new-york.cztf"),
    ),
    (
        "Europe/London",
        "europe-london.cztf",
        include_bytes!("../src/tz/testdata/europe-london.cztf"),
    ),
    (
        "Europe/Paris",
        "europe-paris.cztf",
        include_bytes!("../src/tz/testdata/europe-paris.cztf"),
    ),
];

/// The provider index written into every test zone directory.
const INDEX: &str = "\
zone America/New_York america-new-york.cztf
zone Europe/London europe-london.cztf
zone Europe/Paris europe-paris.cztf

link GB Europe/London
link Europe/Jersey Europe/London
link US/Eastern America/New_York
link Etc/UTC UTC
";

/// Writes the test zone tables and their index into `dir`.
fn write_zone_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::write(dir.join("index"), INDEX)?;
    for &(_, file, data) in FIXTURES {
        std::fs::write(dir.join(file), data)?;
    }
    Ok(())
}

/// Returns a test zone directory along with a provider over it.
///
/// The directory is deleted when the returned handle is dropped.
fn zone_dir() -> anyhow::Result<(tempfile::TempDir, TableProvider)> {
    let _ = env_logger::try_init();

    let dir = tempfile::tempdir()?;
    write_zone_dir(dir.path())?;
    let provider = TableProvider::from_dir(dir.path())?;
    Ok((dir, provider))
}

/// Returns the zone with the given identifier from the test tables.
///
/// This panics if the zone doesn't exist.
fn zone(id: &str) -> TimeZone {
    let (_dir, provider) = zone_dir().unwrap();
    provider.zone(id).unwrap_or_else(|| panic!("no test zone {id}"))
}
