use crate::tz::{TimeZone, ZoneTable};

/// A list of all compiled zone tables in our testdata directory.
///
/// The tables were compiled from the EU and US daylight saving rules and
/// only cover the periods our tests need: Europe/London and Europe/Paris
/// from 1996 through 2037, and America/New_York from 1987 through 2037.
/// Europe/London also starts with its local mean time period, which ends
/// in 1847.
pub(crate) const ZONE_TEST_FILES: &[ZoneTestFile] = &[
    ZoneTestFile {
        id: "America/New_York",
        data: include_bytes!("testdata/america-new-york.cztf"),
    },
    ZoneTestFile {
        id: "Europe/London",
        data: include_bytes!("testdata/europe-london.cztf"),
    },
    ZoneTestFile {
        id: "Europe/Paris",
        data: include_bytes!("testdata/europe-paris.cztf"),
    },
];

/// A single compiled zone table.
#[derive(Clone, Copy)]
pub(crate) struct ZoneTestFile {
    pub(crate) id: &'static str,
    pub(crate) data: &'static [u8],
}

impl ZoneTestFile {
    /// Look up the test table for the given zone identifier.
    ///
    /// If one doesn't exist, then this panics and fails the current test.
    pub(crate) fn get(id: &str) -> ZoneTestFile {
        for &file in ZONE_TEST_FILES {
            if file.id == id {
                return file;
            }
        }
        panic!("could not find zone test file for {id:?}")
    }

    /// Parse this test data into a table.
    pub(crate) fn parse(self) -> ZoneTable {
        ZoneTable::parse(Some(self.id), self.data).unwrap_or_else(|err| {
            panic!("failed to parse zone test file for {:?}: {err}", self.id)
        })
    }
}

/// Returns the time zone for the given test table.
pub(crate) fn zone(id: &str) -> TimeZone {
    TimeZone::table(ZoneTestFile::get(id).parse())
}

#[test]
fn every_test_file_parses() {
    for file in ZONE_TEST_FILES {
        let table = file.parse();
        assert_eq!(table.id(), file.id);
        assert_eq!(table.to_bytes(), file.data, "{}", file.id);
    }
}
