use chrono::NaiveDate;

const NOT_STARTED: [&str; 4] = ["not started", "-", "n/a", "na"];

const TEXT_LAYOUTS: [&str; 6] = [
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%d %B %Y",
];

/// Parses a start-date cell. Never fails: anything unreadable is `None`.
///
/// Slash dates are `YYYY/MM/DD` when the first part has four characters and
/// `DD/MM/YY` otherwise. Inputs such as "01/02/03" are resolved by that rule
/// alone; the two layouts cannot be told apart any further.
pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let lowered = value.to_lowercase();
    if NOT_STARTED.contains(&lowered.as_str()) {
        return None;
    }

    let parts: Vec<&str> = value.split('/').collect();
    if parts.len() == 3 {
        return parse_slash_parts(&parts);
    }

    TEXT_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(value, layout).ok())
}

fn parse_slash_parts(parts: &[&str]) -> Option<NaiveDate> {
    let first = parts[0].trim();
    let (year, month, day) = if first.len() == 4 {
        (
            first.parse::<i32>().ok()?,
            parts[1].trim().parse::<u32>().ok()?,
            parts[2].trim().parse::<u32>().ok()?,
        )
    } else {
        let year_part = parts[2].trim();
        let year = year_part.parse::<i32>().ok()?;
        let year = if year_part.len() <= 2 {
            expand_two_digit_year(year)
        } else {
            year
        };
        (
            year,
            parts[1].trim().parse::<u32>().ok()?,
            first.parse::<u32>().ok()?,
        )
    };

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn expand_two_digit_year(year: i32) -> i32 {
    if year < 50 {
        year + 2000
    } else {
        year + 1900
    }
}

/// Last calendar day of the given month.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
