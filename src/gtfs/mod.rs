// src/gtfs/mod.rs

//! The GTFS tables and the feed they make up together.
//!
//! Tables are loaded in dependency order: a table holding foreign keys is only
//! read once the tables it points into are complete. Independent tables within a
//! stage are loaded on the rayon pool unless the session is configured otherwise.

pub mod agency;
pub mod calendar;
pub mod feed_info;
pub mod frequencies;
pub mod routes;
pub mod shapes;
pub mod stop_times;
pub mod stops;
pub mod trips;

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Cursor, Read, Seek, Write},
    path::Path,
};
use tracing::{debug, info, instrument};
use zip::{ZipArchive, ZipWriter};

use crate::{
    session::FeedSession,
    table::{Table, TableSpec},
};

pub use agency::{Agency, AgencyTable};
pub use calendar::{Calendar, CalendarDate, CalendarDateTable, CalendarTable, ServiceDate};
pub use feed_info::{FeedInfo, FeedInfoTable};
pub use frequencies::{Frequency, FrequencyTable};
pub use routes::{Route, RouteTable};
pub use shapes::{ShapePoint, ShapeTable};
pub use stop_times::{StopTime, StopTimeTable};
pub use stops::{Stop, StopTable};
pub use trips::{Trip, TripTable};

/// Every table of one feed.
#[derive(Debug)]
pub struct Feed {
    pub agencies: Table<Agency>,
    pub stops: Table<Stop>,
    pub routes: Table<Route>,
    pub trips: Table<Trip>,
    pub stop_times: Table<StopTime>,
    pub calendars: Table<Calendar>,
    pub calendar_dates: Table<CalendarDate>,
    pub shapes: Table<ShapePoint>,
    pub frequencies: Table<Frequency>,
    pub feed_info: Table<FeedInfo>,
}

/// Runs both closures, on the rayon pool when `parallel`, else `a` then `b`.
fn both<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}

/// Each table gets its own archive handle so tables can be read concurrently.
fn load_one<S, F, R>(
    open: &F,
    session: &FeedSession,
    spec: &S,
    table: &mut Table<S::Entity>,
) -> Result<()>
where
    S: TableSpec,
    F: Fn() -> Result<ZipArchive<R>>,
    R: Read + Seek,
{
    let mut archive = open()?;
    session.load_into(&mut archive, spec, table)
}

/// First failure of a stage, once every table in it has run.
fn stage<const N: usize>(results: [Result<()>; N]) -> Result<()> {
    results.into_iter().collect()
}

fn open_path(path: &Path) -> impl Fn() -> Result<ZipArchive<BufReader<File>>> + Sync + '_ {
    move || {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        ZipArchive::new(BufReader::new(file))
            .with_context(|| format!("reading zip directory of {}", path.display()))
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    /// A feed with every table empty.
    pub fn new() -> Self {
        Feed {
            agencies: Table::new(AgencyTable::NAME),
            stops: Table::new(StopTable::NAME),
            routes: Table::new(RouteTable::NAME),
            trips: Table::new(TripTable::NAME),
            stop_times: Table::new(StopTimeTable::NAME),
            calendars: Table::new(CalendarTable::NAME),
            calendar_dates: Table::new(CalendarDateTable::NAME),
            shapes: Table::new(ShapeTable::NAME),
            frequencies: Table::new(FrequencyTable::NAME),
            feed_info: Table::new(FeedInfoTable::NAME),
        }
    }

    /// Loads every table through archives produced by `open`.
    ///
    /// Diagnostics go to the session; only archive I/O failures are returned.
    pub fn load_from<F, R>(open: F, session: &FeedSession) -> Result<Feed>
    where
        F: Fn() -> Result<ZipArchive<R>> + Sync,
        R: Read + Seek,
    {
        let mut feed = Feed::new();
        feed.load_into(open, session)?;
        Ok(feed)
    }

    /// Fills this feed's tables, stage by stage.
    ///
    /// When an archive fault stops the load, every table that completed keeps its
    /// records, the failing table keeps the rows read before the fault, and later
    /// stages are not started.
    #[instrument(level = "info", skip_all)]
    pub fn load_into<F, R>(&mut self, open: F, session: &FeedSession) -> Result<()>
    where
        F: Fn() -> Result<ZipArchive<R>> + Sync,
        R: Read + Seek,
    {
        let parallel = session.config().parallel;
        let open = &open;
        let Feed {
            agencies,
            stops,
            routes,
            trips,
            stop_times,
            calendars,
            calendar_dates,
            shapes,
            frequencies,
            feed_info,
        } = self;

        // Tables without foreign keys.
        let ((a, b), ((c, d), (e, f))) = both(
            parallel,
            || {
                both(
                    parallel,
                    || load_one(open, session, &AgencyTable, agencies),
                    || load_one(open, session, &StopTable, stops),
                )
            },
            || {
                both(
                    parallel,
                    || {
                        both(
                            parallel,
                            || load_one(open, session, &CalendarTable, calendars),
                            || load_one(open, session, &CalendarDateTable, calendar_dates),
                        )
                    },
                    || {
                        both(
                            parallel,
                            || load_one(open, session, &ShapeTable, shapes),
                            || load_one(open, session, &FeedInfoTable, feed_info),
                        )
                    },
                )
            },
        );
        stage([a, b, c, d, e, f])?;

        load_one(open, session, &RouteTable { agencies: &*agencies }, routes)?;
        load_one(open, session, &TripTable { routes: &*routes }, trips)?;

        let trips: &Table<Trip> = trips;
        let stops: &Table<Stop> = stops;
        let (st, fr) = both(
            parallel,
            || load_one(open, session, &StopTimeTable { trips, stops }, stop_times),
            || load_one(open, session, &FrequencyTable { trips }, frequencies),
        );
        stage([st, fr])?;

        info!(
            "loaded feed: {} stops, {} trips, {} stop times, {} diagnostics",
            stops.len(),
            trips.len(),
            stop_times.len(),
            session.errors().len()
        );
        Ok(())
    }

    pub fn load_path<P: AsRef<Path>>(path: P, session: &FeedSession) -> Result<Feed> {
        let mut feed = Feed::new();
        feed.load_path_into(path, session)?;
        Ok(feed)
    }

    /// [`Self::load_into`] from an archive on disk.
    pub fn load_path_into<P: AsRef<Path>>(&mut self, path: P, session: &FeedSession) -> Result<()> {
        let path = path.as_ref();
        info!("loading feed {}", path.display());
        self.load_into(open_path(path), session)
    }

    pub fn load_bytes(bytes: &[u8], session: &FeedSession) -> Result<Feed> {
        Self::load_from(
            || ZipArchive::new(Cursor::new(bytes)).context("reading zip directory"),
            session,
        )
    }

    /// Writes every table into `zip` in source-row order. Returns rows written per table.
    #[instrument(level = "info", skip_all)]
    pub fn write<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        session: &FeedSession,
    ) -> Result<BTreeMap<&'static str, u64>> {
        let mut written = BTreeMap::new();
        let mut out = FeedWriter {
            zip,
            session,
            written: &mut written,
        };
        out.table(&AgencyTable, &self.agencies)?;
        out.table(&StopTable, &self.stops)?;
        out.table(
            &RouteTable {
                agencies: &self.agencies,
            },
            &self.routes,
        )?;
        out.table(
            &TripTable {
                routes: &self.routes,
            },
            &self.trips,
        )?;
        out.table(
            &StopTimeTable {
                trips: &self.trips,
                stops: &self.stops,
            },
            &self.stop_times,
        )?;
        out.table(&CalendarTable, &self.calendars)?;
        out.table(&CalendarDateTable, &self.calendar_dates)?;
        out.table(&ShapeTable, &self.shapes)?;
        out.table(
            &FrequencyTable {
                trips: &self.trips,
            },
            &self.frequencies,
        )?;
        out.table(&FeedInfoTable, &self.feed_info)?;
        Ok(written)
    }

    /// Writes a complete archive at `path`, replacing any existing file.
    pub fn write_path<P: AsRef<Path>>(
        &self,
        path: P,
        session: &FeedSession,
    ) -> Result<BTreeMap<&'static str, u64>> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let written = self.write(&mut zip, session)?;
        let mut inner = zip
            .finish()
            .with_context(|| format!("finishing archive {}", path.display()))?;
        inner.flush()?;
        info!("wrote feed {}", path.display());
        Ok(written)
    }

    /// Record count per table name.
    pub fn table_sizes(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            (AgencyTable::NAME, self.agencies.len()),
            (StopTable::NAME, self.stops.len()),
            (RouteTable::NAME, self.routes.len()),
            (TripTable::NAME, self.trips.len()),
            (StopTimeTable::NAME, self.stop_times.len()),
            (CalendarTable::NAME, self.calendars.len()),
            (CalendarDateTable::NAME, self.calendar_dates.len()),
            (ShapeTable::NAME, self.shapes.len()),
            (FrequencyTable::NAME, self.frequencies.len()),
            (FeedInfoTable::NAME, self.feed_info.len()),
        ])
    }
}

struct FeedWriter<'z, 'w, W: Write + Seek> {
    zip: &'z mut ZipWriter<W>,
    session: &'z FeedSession,
    written: &'w mut BTreeMap<&'static str, u64>,
}

impl<W: Write + Seek> FeedWriter<'_, '_, W> {
    fn table<S: TableSpec>(&mut self, spec: &S, table: &Table<S::Entity>) -> Result<()> {
        if table.is_empty() && self.session.config().skip_empty_tables {
            debug!("skipping empty table {}", S::NAME);
            return Ok(());
        }
        let rows = self.session.write(spec, table.by_source_row(), &mut *self.zip)?;
        self.written.insert(S::NAME, rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::INT_MISSING,
        config::SessionConfig,
        diagnostics::{DiagnosticKind, Tier},
        table::{CompoundKey, Entity},
        testutil::{corrupt_after, entry_text, init_test_logging, zip_bytes},
    };
    use std::sync::Arc;
    use tempfile::tempdir;

    const AGENCY: &str = "agency_id,agency_name,agency_url,agency_timezone\n\
                          MT,Metro Transit,https://metro.example.org,Australia/Sydney\n";
    const STOPS: &str = "stop_id,stop_name,stop_lat,stop_lon\n\
                         S1,Central,-33.8830,151.2060\n\
                         S2,Town Hall,-33.8730,151.2070\n";
    const ROUTES: &str = "route_id,agency_id,route_short_name,route_type\n\
                          R1,MT,1,3\n\
                          R2,XX,2,3\n";
    const TRIPS: &str = "route_id,service_id,trip_id,direction_id\n\
                         R1,WK,T1,0\n\
                         R1,WK,T2,1\n";
    const STOP_TIMES: &str = "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                              T1,08:00:00,08:00:30,S1,1\n\
                              T1,08:05:00,08:05:30,S2,2\n\
                              T2,25:10:00,25:10:00,S9,1\n\
                              T9,08:00:00,08:00:00,S9,1\n";
    const CALENDAR: &str = "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                            WK,1,1,1,1,1,0,0,20240101,20241231\n";
    const FREQUENCIES: &str = "trip_id,start_time,end_time,headway_secs\n\
                               T1,06:00:00,09:00:00,600\n";

    const SHAPES: &str = "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
                          SH1,-33.8830,151.2060,1\n\
                          SH1,-33.8730,151.2070,2\n";
    const FEED_INFO: &str = "feed_publisher_name,feed_publisher_url,feed_lang\n\
                             Metro Transit,https://Metro.example.org,en\n";

    fn sample_feed() -> Result<Vec<u8>> {
        zip_bytes(&[
            ("agency.txt", AGENCY),
            ("stops.txt", STOPS),
            ("routes.txt", ROUTES),
            ("trips.txt", TRIPS),
            ("stop_times.txt", STOP_TIMES),
            ("calendar.txt", CALENDAR),
            ("frequencies.txt", FREQUENCIES),
            ("shapes.txt", SHAPES),
            ("feed_info.txt", FEED_INFO),
        ])
    }

    fn sequential() -> FeedSession {
        FeedSession::new(SessionConfig {
            parallel: false,
            ..SessionConfig::default()
        })
    }

    fn integrity_keys(session: &FeedSession) -> Vec<(String, String)> {
        let mut keys: Vec<_> = session
            .errors()
            .snapshot()
            .into_iter()
            .filter_map(|d| match d.kind {
                DiagnosticKind::ReferentialIntegrity { key } => {
                    Some((d.column.unwrap_or_default(), key))
                }
                _ => None,
            })
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn loads_every_table_and_resolves_references() -> Result<()> {
        init_test_logging();
        let bytes = sample_feed()?;
        let session = FeedSession::default();
        let feed = Feed::load_bytes(&bytes, &session)?;

        let sizes = feed.table_sizes();
        assert_eq!(sizes["agency"], 1);
        assert_eq!(sizes["stops"], 2);
        assert_eq!(sizes["routes"], 2);
        assert_eq!(sizes["trips"], 2);
        assert_eq!(sizes["stop_times"], 4);
        assert_eq!(sizes["calendar"], 1);
        assert_eq!(sizes["calendar_dates"], 0);
        assert_eq!(sizes["frequencies"], 1);
        assert_eq!(sizes["shapes"], 2);
        assert_eq!(sizes["feed_info"], 1);

        let late = feed
            .stop_times
            .get(&CompoundKey::new(Arc::from("T2"), 1))
            .expect("T2 stop time");
        assert_eq!(late.arrival_time, 25 * 3600 + 600);
        assert_eq!(feed.frequencies.values().next().map(|f| f.headway_secs), Some(600));

        // S9 is dangling in two rows but reported once.
        assert_eq!(
            integrity_keys(&session),
            vec![
                ("agency_id".to_string(), "XX".to_string()),
                ("stop_id".to_string(), "S9".to_string()),
                ("trip_id".to_string(), "T9".to_string()),
            ]
        );

        // absent optional tables are not diagnostics
        assert_eq!(
            session.errors().count_where(|d| d.tier() == Tier::Structural),
            0
        );
        Ok(())
    }

    #[test]
    fn interned_strings_are_shared_across_tables() -> Result<()> {
        let bytes = sample_feed()?;
        let session = sequential();
        let feed = Feed::load_bytes(&bytes, &session)?;

        let trip = feed.trips.get("T1").expect("T1");
        let route_key = feed.routes.get("R1").and_then(Entity::key).expect("R1");
        assert!(Arc::ptr_eq(trip.route_id.as_ref().expect("route_id"), &route_key));
        Ok(())
    }

    #[test]
    fn parallel_and_sequential_loads_agree() -> Result<()> {
        let bytes = sample_feed()?;
        let par = FeedSession::default();
        let seq = sequential();
        let a = Feed::load_bytes(&bytes, &par)?;
        let b = Feed::load_bytes(&bytes, &seq)?;
        assert_eq!(a.table_sizes(), b.table_sizes());
        assert_eq!(par.errors().counts_by_kind(), seq.errors().counts_by_kind());
        Ok(())
    }

    #[test]
    fn missing_required_tables_are_reported() -> Result<()> {
        let bytes = zip_bytes(&[("stops.txt", STOPS)])?;
        let session = sequential();
        let feed = Feed::load_bytes(&bytes, &session)?;
        assert_eq!(feed.stops.len(), 2);

        let mut missing: Vec<String> = session
            .errors()
            .snapshot()
            .into_iter()
            .filter(|d| d.kind == DiagnosticKind::MissingTable)
            .map(|d| d.table)
            .collect();
        missing.sort();
        assert_eq!(missing, vec!["agency", "routes", "stop_times", "trips"]);
        Ok(())
    }

    #[test]
    fn round_trip_through_written_archive() -> Result<()> {
        init_test_logging();
        let bytes = sample_feed()?;
        let session = sequential();
        let feed = Feed::load_bytes(&bytes, &session)?;

        let dir = tempdir()?;
        let out = dir.path().join("rewritten.zip");
        let written = feed.write_path(&out, &session)?;
        assert_eq!(written.get("stop_times"), Some(&4));
        // empty optional tables are left out
        assert!(!written.contains_key("calendar_dates"));
        assert_eq!(written.get("shapes"), Some(&2));

        let rewritten = std::fs::read(&out)?;
        let stop_times = entry_text(&rewritten, "stop_times.txt")?;
        let mut lines = stop_times.lines();
        assert_eq!(
            lines.next(),
            Some("trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type,drop_off_type,shape_dist_traveled,timepoint")
        );
        assert_eq!(lines.next(), Some("T1,08:00:00,08:00:30,S1,1,,,,,"));

        // URLs go back out exactly as they came in
        let agency = entry_text(&rewritten, "agency.txt")?;
        assert_eq!(
            agency.lines().nth(1),
            Some("MT,Metro Transit,https://metro.example.org,Australia/Sydney,,,,")
        );
        let feed_info = entry_text(&rewritten, "feed_info.txt")?;
        assert_eq!(
            feed_info.lines().nth(1),
            Some("Metro Transit,https://Metro.example.org,en,,,,,")
        );

        let reloaded_session = sequential();
        let reloaded = Feed::load_path(&out, &reloaded_session)?;
        assert_eq!(reloaded.table_sizes(), feed.table_sizes());
        let stop = reloaded.stops.get("S2").expect("S2");
        assert_eq!((stop.stop_lat, stop.stop_lon), (-33.873, 151.207));
        assert_eq!(stop.location_type, 0);
        let route = reloaded.routes.get("R1").expect("R1");
        assert_eq!(route.route_sort_order, INT_MISSING);
        assert_eq!(integrity_keys(&reloaded_session), integrity_keys(&session));
        Ok(())
    }

    #[test]
    fn archive_fault_keeps_completed_tables() -> Result<()> {
        let mut bytes = sample_feed()?;
        corrupt_after(&mut bytes, "R1,WK,T2,");
        let session = sequential();

        let mut feed = Feed::new();
        let err = feed
            .load_into(
                || ZipArchive::new(Cursor::new(&bytes[..])).context("reading zip directory"),
                &session,
            )
            .expect_err("trips.txt fails its checksum");
        assert!(format!("{err:#}").contains("trips.txt"));

        assert_eq!(feed.agencies.len(), 1);
        assert_eq!(feed.stops.len(), 2);
        assert_eq!(feed.shapes.len(), 2);
        assert_eq!(feed.routes.len(), 2);
        // rows parsed before the fault survive
        assert!(feed.trips.get("T1").is_some());
        // later stages never ran
        assert!(feed.stop_times.is_empty());
        assert!(feed.frequencies.is_empty());
        Ok(())
    }

    #[test]
    fn unreadable_archive_is_an_error() {
        let session = FeedSession::default();
        assert!(Feed::load_bytes(b"not a zip", &session).is_err());
    }
}
