use regex::{Regex, RegexBuilder};

/// Address searched by the plan PDF flow when no other is given.
pub const DEFAULT_ADDRESS: &str = "17 Bolinda Road, Balwyn North, VIC 3104";

/// Which heuristic picked an autocomplete option, and the option's index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SuggestionMatch {
    /// The option's label contains the whole address.
    FullAddress(usize),
    /// The option matched "street ... suburb".
    StreetAndSuburb(usize),
    /// Nothing matched, take the first option.
    First,
}

impl SuggestionMatch {
    pub fn index(&self) -> usize {
        match self {
            SuggestionMatch::FullAddress(index) | SuggestionMatch::StreetAndSuburb(index) => *index,
            SuggestionMatch::First => 0,
        }
    }
}

/// Splits `"17 Bolinda Road, Balwyn North, VIC 3104"` into
/// `("17 Bolinda Road", Some("Balwyn North"))`.
pub fn street_and_suburb(full_address: &str) -> (&str, Option<&str>) {
    let mut parts = full_address.split(',');
    let street = parts.next().unwrap_or_default().trim();
    let suburb = parts.next().map(str::trim).filter(|suburb| !suburb.is_empty());
    (street, suburb)
}

/// Case-insensitive `street.*suburb` pattern, tolerant of whatever the site
/// puts between the two (`Road` vs `Rd`, missing commas, postcode first...).
pub fn street_and_suburb_pattern(full_address: &str) -> Regex {
    let (street, suburb) = street_and_suburb(full_address);
    let pattern = match suburb {
        Some(suburb) => format!("{}.*{}", regex::escape(street), regex::escape(suburb)),
        None => regex::escape(street),
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("escaped address is a valid pattern")
}

/// Picks the autocomplete option to click for `full_address`.
///
/// Returns `None` only when there is nothing to click.
pub fn match_suggestion<S: AsRef<str>>(
    options: &[S],
    full_address: &str,
) -> Option<SuggestionMatch> {
    if options.is_empty() {
        return None;
    }

    // Labels come from rendered text, so line breaks and runs of spaces are
    // collapsed before either comparison.
    let labels: Vec<String> = options
        .iter()
        .map(|option| normalize(option.as_ref()))
        .collect();

    let wanted = normalize(full_address);
    if let Some(index) = labels.iter().position(|label| label.contains(&wanted)) {
        return Some(SuggestionMatch::FullAddress(index));
    }

    let fuzzy = street_and_suburb_pattern(&wanted);
    if let Some(index) = labels.iter().position(|label| fuzzy.is_match(label)) {
        return Some(SuggestionMatch::StreetAndSuburb(index));
    }

    Some(SuggestionMatch::First)
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
