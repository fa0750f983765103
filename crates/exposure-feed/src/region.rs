//! Canberra suburb to region lookup
//!
//! Suburb lists follow the districts of the ACT. Matching ignores case and any
//! non-word characters, so "O'Connor", "oconnor" and "O Connor" are the same.

use crate::fingerprint::Fingerprinted;
use crate::schema::{REGION, SUBURB};

/// Region reported for suburbs that are not in the table
pub const UNKNOWN_REGION: &str = "Other";

const REGIONS: &[(&str, &[&str])] = &[
    (
        "Belconnen",
        &[
            "Aranda", "Belconnen", "Belconnen Town Centre", "Emu Ridge", "Bruce", "Charnwood",
            "Cook", "Dunlop", "Evatt", "Florey", "Flynn", "Fraser", "Giralang", "Hawker",
            "Higgins", "Holt", "Kippax Centre", "Kaleen", "Latham", "Lawson", "Macgregor",
            "Macnamara", "Macquarie", "Jamison Centre", "Jamison", "McKellar", "Melba", "Page",
            "Scullin", "Spence", "Strathnairn", "Weetangera",
        ],
    ),
    (
        "Inner North",
        &[
            "Acton", "Ainslie", "Braddon", "Campbell", "Duntroon", "City", "Canberra City",
            "Civic", "Dickson", "Dickson Centre", "Downer", "Hackett", "Lyneham",
            "North Lyneham", "O'Connor", "Reid", "Russell", "Turner", "Watson",
        ],
    ),
    (
        "Inner South",
        &[
            "Barton", "Capital Hill", "Deakin", "Forrest", "Fyshwick", "Griffith", "Manuka",
            "Kingston", "The Causeway", "Narrabundah", "Parkes", "Red Hill", "Yarralumla",
        ],
    ),
    (
        "Gungahlin",
        &[
            "Amaroo", "Bonner", "Casey", "Crace", "Forde", "Franklin", "Gungahlin",
            "Gungahlin Town Centre", "Harrison", "Jacka", "Kenny", "Kinlyside", "Mitchell",
            "Moncrieff", "Ngunnawal", "Nicholls", "Palmerston", "Taylor", "Throsby",
        ],
    ),
    (
        "Jerrabomberra",
        &["Beard", "Hume", "Oaks Estate", "Symonston", "Jerrabomberra"],
    ),
    (
        "Majura",
        &["Canberra Airport", "Airport", "Pialligo", "Majura Park", "Majura"],
    ),
    (
        "Molonglo Valley",
        &["Denman Prospect", "Coombs", "Molonglo", "Molonglo Valley", "Sulman", "Whitlam", "Wright"],
    ),
    (
        "Tuggeranong",
        &[
            "Banks", "Bonython", "Calwell", "Chisholm", "Conder", "Fadden", "Gilmore", "Gordon",
            "Gowrie", "Greenway", "Tuggeranong Town Centre", "Isabella Plains", "Kambah",
            "Kambah Village Centre", "Macarthur", "Monash", "Oxley", "Richardson", "Theodore",
            "Wanniassa", "Erindale Centre", "Tuggeranong",
        ],
    ),
    (
        "Weston Creek",
        &[
            "Chapman", "Duffy", "Fisher", "Holder", "Rivett", "Stirling", "Waramanga", "Weston",
            "Weston Creek", "Weston Creek Centre",
        ],
    ),
    (
        "Woden Valley",
        &[
            "Chifley", "Curtin", "Curtin Centre", "Farrer", "Garran", "Hughes", "Isaacs", "Lyons",
            "Mawson", "Southlands Centre", "O'Malley", "Pearce", "Phillip", "Woden",
            "Woden Town Centre", "Swinger Hill", "Torrens",
        ],
    ),
];

fn match_key(suburb: &str) -> String {
    suburb
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Map a suburb name to its region, or [`UNKNOWN_REGION`]
pub fn suburb_to_region(suburb: &str) -> &'static str {
    let key = match_key(suburb);
    if key.is_empty() {
        return UNKNOWN_REGION;
    }

    REGIONS
        .iter()
        .find(|(_, suburbs)| suburbs.iter().any(|s| match_key(s) == key))
        .map(|(region, _)| *region)
        .unwrap_or(UNKNOWN_REGION)
}

/// Append the region field to every record of a fingerprinted batch
///
/// Runs after fingerprinting so the derived field never affects identity.
pub fn enrich(batch: &mut [Fingerprinted]) {
    for item in batch.iter_mut() {
        let region = suburb_to_region(item.record.get(SUBURB).unwrap_or_default());
        item.record.set(REGION, region);
    }
}
