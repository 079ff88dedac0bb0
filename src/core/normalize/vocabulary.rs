//! Canonical column names, rename maps and coercion tables per source kind.

use super::coerce::Coercion;
use transit_star_types::SourceKind;

pub const TRIP_DATE: &str = "trip_date";
pub const LINE_CODE: &str = "line_code";
pub const FRANCHISE_CODE: &str = "franchise_code";
pub const OPERATING_COMPANY: &str = "operating_company";
pub const VEHICLE_ID: &str = "vehicle_id";
pub const EVENT_TIME: &str = "event_time";
pub const INGESTED_AT: &str = "ingested_at";

const SCHEDULED_TRIP_RENAMES: &[(&str, &str)] = &[
    ("viagem", TRIP_DATE),
    ("linha", LINE_CODE),
    ("sublinha", "subline_code"),
    ("pc", "control_point"),
    ("concessionaria", FRANCHISE_CODE),
    ("saida", "departure_time"),
    ("chegada", "arrival_time"),
    ("veiculo", VEHICLE_ID),
    ("catraca saida", "turnstile_departure"),
    ("catraca chegada", "turnstile_arrival"),
    ("ocorrencia", "occurrence_flag"),
    ("justificativa", "justification_flag"),
    ("tipo dia", "day_type"),
    ("extensao", "trip_length"),
    ("falha mecanica", "mechanical_failure_flag"),
    ("evento inseguro", "unsafe_event_flag"),
    ("indicador fechamento", "closing_flag"),
    ("data fechamento", "closing_date"),
    ("total usuarios", "total_passengers"),
    ("empresa operadora", OPERATING_COMPANY),
];

const SCHEDULED_TRIP_COERCIONS: &[(&str, Coercion)] = &[
    (TRIP_DATE, Coercion::DayFirstDate),
    ("closing_date", Coercion::DayFirstDate),
    ("departure_time", Coercion::TimeOfDay),
    ("arrival_time", Coercion::TimeOfDay),
    ("trip_length", Coercion::Decimal),
    (VEHICLE_ID, Coercion::Integer),
    ("total_passengers", Coercion::Integer),
    ("turnstile_departure", Coercion::Integer),
    ("turnstile_arrival", Coercion::Integer),
];

const VEHICLE_POSITION_RENAMES: &[(&str, &str)] = &[
    ("ev", "event_code"),
    ("hr", EVENT_TIME),
    ("lt", "latitude"),
    ("lg", "longitude"),
    ("nv", VEHICLE_ID),
    ("vl", "speed"),
    ("nl", LINE_CODE),
    ("dg", "heading"),
    ("sv", "direction"),
    ("dt", "distance_travelled"),
];

const VEHICLE_POSITION_COERCIONS: &[(&str, Coercion)] = &[
    (EVENT_TIME, Coercion::CompactTimestamp),
    ("latitude", Coercion::Decimal),
    ("longitude", Coercion::Decimal),
    ("speed", Coercion::Decimal),
    ("distance_travelled", Coercion::Decimal),
    ("event_code", Coercion::Integer),
    (VEHICLE_ID, Coercion::Integer),
    (LINE_CODE, Coercion::Integer),
    ("heading", Coercion::Integer),
    ("direction", Coercion::Integer),
];

/// Signature column pairs, raw and canonical spellings
const SCHEDULED_TRIP_SIGNATURES: &[[&str; 2]] = &[["viagem", "saida"], [TRIP_DATE, "departure_time"]];
const VEHICLE_POSITION_SIGNATURES: &[[&str; 2]] = &[["ev", "hr"], ["event_code", EVENT_TIME]];

/// Classify an extract by its normalized header names.
pub fn classify<S: AsRef<str>>(columns: &[S]) -> SourceKind {
    let has_all = |signature: &[&str; 2]| {
        signature
            .iter()
            .all(|wanted| columns.iter().any(|c| c.as_ref() == *wanted))
    };
    if SCHEDULED_TRIP_SIGNATURES.iter().any(has_all) {
        SourceKind::ScheduledTrip
    } else if VEHICLE_POSITION_SIGNATURES.iter().any(has_all) {
        SourceKind::VehiclePosition
    } else {
        SourceKind::Unknown
    }
}

pub fn renames(kind: SourceKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        SourceKind::ScheduledTrip => SCHEDULED_TRIP_RENAMES,
        SourceKind::VehiclePosition => VEHICLE_POSITION_RENAMES,
        SourceKind::Unknown => &[],
    }
}

pub fn coercions(kind: SourceKind) -> &'static [(&'static str, Coercion)] {
    match kind {
        SourceKind::ScheduledTrip => SCHEDULED_TRIP_COERCIONS,
        SourceKind::VehiclePosition => VEHICLE_POSITION_COERCIONS,
        SourceKind::Unknown => &[],
    }
}

/// Canonical name for a normalized header, if the kind renames it
pub fn canonical_name(kind: SourceKind, header: &str) -> Option<&'static str> {
    renames(kind)
        .iter()
        .find(|(raw, _)| *raw == header)
        .map(|(_, canonical)| *canonical)
}

/// Trim, lowercase, fold Portuguese diacritics and collapse inner whitespace.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
