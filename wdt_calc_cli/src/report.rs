use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;
use wdt_calc_common::{Candidate, Catalog, ClockSource, SearchOutcome, TimeUnit, TimerDivider, Variant};

use crate::config::{READOUT_PRECISION, SCIENTIFIC_THRESHOLD, TABLE_PRECISION};

/// Order of the rendered candidate listing. The recommendation never depends
/// on it.
#[derive(ValueEnum, Serialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Order the catalog enumerates them in
    #[default]
    Enumeration,
    /// Smallest error first; ties keep enumeration order
    Error,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Request {
    pub value: f64,
    pub unit: TimeUnit,
    pub desired_us: f64,
    pub variant: Variant,
    pub tolerance_us: f64,
}

/// Best interval and error converted back to the unit of the request.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Readout {
    pub unit: TimeUnit,
    pub time: f64,
    pub error: f64,
}

impl Readout {
    pub fn new(best: &Candidate, unit: TimeUnit) -> Self {
        Self { unit, time: best.time_in(unit), error: best.error_in(unit) }
    }
}

#[derive(Serialize, Debug)]
pub struct Report<'a> {
    pub request: Request,
    pub short_circuited: bool,
    pub total_candidates: usize,
    pub candidates: Vec<&'a Candidate>,
    pub best: &'a Candidate,
    pub readout: Readout,
}

impl<'a> Report<'a> {
    pub fn new(request: Request, outcome: &'a SearchOutcome, sort: SortOrder, top: Option<usize>) -> Self {
        let mut candidates: Vec<&Candidate> = outcome.candidates.iter().collect();
        if sort == SortOrder::Error {
            candidates.sort_by(|a, b| a.error_us.total_cmp(&b.error_us));
        }
        if let Some(top) = top {
            candidates.truncate(top);
        }

        let readout = Readout::new(&outcome.best, request.unit);
        Self {
            request,
            short_circuited: outcome.short_circuited,
            total_candidates: outcome.candidates.len(),
            candidates,
            best: &outcome.best,
            readout,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CatalogListing<'a> {
    pub catalog: &'a Catalog,
    pub cardinality: usize,
}

fn format_frequency(hz: f64) -> String {
    if hz.fract() == 0.0 {
        format!("{:.0}", hz)
    } else {
        format!("{:.3}", hz)
    }
}

fn format_value(value: f64, precision: usize) -> String {
    if value.abs() >= SCIENTIFIC_THRESHOLD {
        format!("{:.*e}", precision, value)
    } else {
        format!("{:.*}", precision, value)
    }
}

fn join_dividers(dividers: &[TimerDivider]) -> String {
    dividers.iter().map(TimerDivider::label).collect::<Vec<_>>().join(" ")
}

pub fn write_table<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    writeln!(out, "{:<12} {:>14}  {:<20} {:<11} {:>18} {:>18}",
             "Clock Source", "Frequency (Hz)", "Prescaler", "WDT Divider", "Time (us)", "Error (us)")?;

    for c in &report.candidates {
        writeln!(out, "{:<12} {:>14}  {:<20} {:<11} {:>18} {:>18}",
                 c.source,
                 format_frequency(c.effective_frequency),
                 c.prescaler.to_string(),
                 c.divider.label(),
                 format_value(c.time_us, TABLE_PRECISION),
                 format_value(c.error_us, TABLE_PRECISION))?;
    }

    let hidden = report.total_candidates - report.candidates.len();
    if hidden > 0 {
        writeln!(out, "... {} more candidates not shown", hidden)?;
    }
    writeln!(out)?;

    write_recommendation(out, report)
}

pub fn write_recommendation<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    let best = report.best;
    let unit = report.readout.unit.token();

    writeln!(out, "Recommended configuration ({} catalog, {} candidates)",
             report.request.variant, report.total_candidates)?;
    writeln!(out, "  Clock source:        {}", best.source)?;
    writeln!(out, "  Base frequency:      {} Hz", best.base_frequency)?;
    writeln!(out, "  Effective frequency: {} Hz", format_frequency(best.effective_frequency))?;
    writeln!(out, "  Prescaler:           {}", best.prescaler)?;
    writeln!(out, "  WDT divider:         {}", best.divider)?;
    writeln!(out, "  Interval:            {} {}", format_value(report.readout.time, READOUT_PRECISION), unit)?;
    writeln!(out, "  Error:               {} {}", format_value(report.readout.error, READOUT_PRECISION), unit)?;
    if report.short_circuited {
        writeln!(out, "  Primary source was within {} us; other sources were not searched.",
                 report.request.tolerance_us)?;
    }

    Ok(())
}

fn write_source<W: Write>(out: &mut W, source: &ClockSource) -> io::Result<()> {
    let frequencies = source.frequencies.iter().map(u32::to_string).collect::<Vec<_>>().join(" ");
    writeln!(out, "  {}", source.name)?;
    writeln!(out, "    Frequencies (Hz): {}", frequencies)?;

    let mut stages = source.prescaling.stages().peekable();
    if stages.peek().is_none() {
        writeln!(out, "    Prescalers:       none")?;
    }
    for stage in stages {
        let dividers = stage.dividers.iter().map(|d| d.label()).collect::<Vec<_>>().join(" ");
        writeln!(out, "    Prescaler {}:   {}", stage.name, dividers)?;
    }

    Ok(())
}

pub fn write_catalog<W: Write>(out: &mut W, catalog: &Catalog) -> io::Result<()> {
    writeln!(out, "Catalog {} ({} candidates)", catalog.name, catalog.cardinality())?;

    if let Some(primary) = &catalog.primary {
        writeln!(out, "Primary source, tried first ({} candidates):", catalog.primary_cardinality())?;
        write_source(out, &primary.source)?;
        writeln!(out, "    WDT dividers:     {}", join_dividers(primary.timer_dividers))?;
    }

    writeln!(out, "Sources ({} candidates):", catalog.broad_cardinality())?;
    for source in catalog.sources {
        write_source(out, source)?;
    }
    writeln!(out, "WDT dividers: {}", join_dividers(catalog.timer_dividers))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wdt_calc_common::{search, to_canonical, SearchOptions};

    fn millisecond_outcome() -> SearchOutcome {
        search(to_canonical(1.0, TimeUnit::Milliseconds), Variant::Full.catalog(), &SearchOptions::default()).unwrap()
    }

    fn request() -> Request {
        Request {
            value: 1.0,
            unit: TimeUnit::Milliseconds,
            desired_us: 1000.0,
            variant: Variant::Full,
            tolerance_us: 0.0,
        }
    }

    fn render(report: &Report) -> String {
        let mut buffer = Vec::new();
        write_table(&mut buffer, report).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn table_lists_every_candidate() {
        let outcome = millisecond_outcome();
        let text = render(&Report::new(request(), &outcome, SortOrder::Enumeration, None));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Clock Source"));
        let first_row: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(first_row, ["ACLK", "32768", "N/A", "2^6", "1953.125", "953.125"]);
        assert_eq!(lines.iter().filter(|l| l.starts_with("SMCLK")).count(), 224);
        assert!(!text.contains("more candidates not shown"));
    }

    #[test]
    fn recommendation_uses_requested_unit() {
        let outcome = millisecond_outcome();
        let text = render(&Report::new(request(), &outcome, SortOrder::Enumeration, None));

        assert!(text.contains("Clock source:        SMCLK"));
        assert!(text.contains("Prescaler:           DIVS=DIV4"));
        assert!(text.contains("WDT divider:         2^9"));
        assert!(text.contains("Effective frequency: 500000 Hz"));
        assert!(text.contains("Interval:            1.024000 ms"));
        assert!(text.contains("Error:               0.024000 ms"));
    }

    #[test]
    fn sorting_and_truncation_leave_best_alone() {
        let outcome = millisecond_outcome();
        let report = Report::new(request(), &outcome, SortOrder::Error, Some(5));

        assert_eq!(report.candidates.len(), 5);
        assert_eq!(*report.candidates[0], outcome.best);
        assert!(report.candidates.windows(2).all(|w| w[0].error_us <= w[1].error_us));
        assert_eq!(report.best, &outcome.best);
        assert!(render(&report).contains("... 451 more candidates not shown"));
    }

    #[test]
    fn json_report_shape() {
        let outcome = millisecond_outcome();
        let report = Report::new(request(), &outcome, SortOrder::Enumeration, None);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["request"]["unit"], "ms");
        assert_eq!(value["request"]["variant"], "full");
        assert_eq!(value["candidates"].as_array().unwrap().len(), 456);
        assert_eq!(value["candidates"][0]["prescalers"].as_array().unwrap().len(), 0);
        assert_eq!(value["best"]["source"], "SMCLK");
        assert_eq!(value["best"]["divider"], "2^9");
        assert_eq!(value["best"]["prescalers"][0]["stage"], "DIVS");
        assert_eq!(value["best"]["prescalers"][0]["divider"], "DIV4");
        assert_eq!(value["short_circuited"], false);
    }

    #[test]
    fn catalog_listing() {
        let mut buffer = Vec::new();
        write_catalog(&mut buffer, Variant::Tiered.catalog()).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("Catalog tiered (1028 candidates)"));
        assert!(text.contains("Primary source, tried first (4 candidates):"));
        assert!(text.contains("    WDT dividers:     2^6 2^9 2^13 2^15"));
        assert!(text.contains("Prescaler DIVM:   DIV1 DIV2 DIV4 DIV8"));
        assert!(text.contains("Prescalers:       none"));
    }

    #[test]
    fn fractional_frequencies_keep_decimals() {
        assert_eq!(format_frequency(32768.0), "32768");
        assert_eq!(format_frequency(333_333.333_333), "333333.333");
    }

    #[test]
    fn huge_values_switch_to_scientific() {
        assert_eq!(format_value(1953.125, 3), "1953.125");
        assert_eq!(format_value(1e300, 3), "1.000e300");

        let outcome = search(to_canonical(1e300, TimeUnit::Seconds), Variant::Full.catalog(),
                             &SearchOptions::default()).unwrap();
        let request = Request { value: 1e300, unit: TimeUnit::Seconds, desired_us: 1e306, ..request() };
        let text = render(&Report::new(request, &outcome, SortOrder::Enumeration, Some(1)));

        assert!(text.lines().all(|line| line.len() < 120));
        assert!(text.contains("1.000e306"));
        assert!(text.contains("Error:               1.000000e300 s"));
    }
}
