use crate::calc::grid::{build_month_grid, month_name, WEEKDAY_HEADERS, WEEK_LEN};
use crate::calc::navigator::MAX_YEAR;
use anyhow::{bail, Context, Result};
use chrono::Datelike;

pub fn run(month_key: &str, json: bool) -> Result<()> {
    let (year, month) = parse_month_key(month_key)?;
    write_grid(year, month, json, &mut std::io::stdout())
}

/// Parses `YYYY-MM` into a year and a zero-based month.
pub(crate) fn parse_month_key(raw: &str) -> Result<(i32, u32)> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .with_context(|| format!("expected YYYY-MM, got '{raw}'"))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("invalid year in '{raw}'"))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("invalid month in '{raw}'"))?;
    if !(1..=MAX_YEAR).contains(&year) {
        bail!("year must be 1-{MAX_YEAR}, got {year}");
    }
    if !(1..=12).contains(&month) {
        bail!("month must be 01-12, got {month}");
    }
    Ok((year, month - 1))
}

pub(crate) fn write_grid<W: std::io::Write>(
    year: i32,
    month: u32,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let cells = build_month_grid(year, month, None);
    if json {
        serde_json::to_writer_pretty(&mut *out, &cells).context("failed to serialize grid")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{:^20}", format!("{} {}", month_name(month), year))?;
    writeln!(out, "{}", WEEKDAY_HEADERS.join(" "))?;
    for week in cells.chunks(WEEK_LEN) {
        let days: Vec<String> = week
            .iter()
            .map(|c| {
                if c.disabled {
                    "  ".to_string()
                } else {
                    format!("{:>2}", c.date.day())
                }
            })
            .collect();
        writeln!(out, "{}", days.join(" ").trim_end())?;
    }
    Ok(())
}
