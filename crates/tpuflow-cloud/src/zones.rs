//! Candidate zones for TPU VM creation

/// Zones tried by `create` when no zone is given, in priority order.
///
/// Taken from `gcloud compute tpus locations list` and ordered Europe first,
/// then US, then Asia.
pub const DEFAULT_ZONES: &[&str] = &[
    "europe-west1-b",
    "europe-west1-c",
    "europe-west1-d",
    "europe-west4-a",
    "europe-west4-b",
    "europe-west4-c",
    "us-west1-b",
    "us-west1-c",
    "us-west4-a",
    "us-west4-b",
    "us-central1-a",
    "us-central1-b",
    "us-central1-c",
    "us-central1-f",
    "us-east1-c",
    "us-east1-d",
    "us-east5-a",
    "us-east5-b",
    "us-east5-c",
    "us-south1-a",
    "us-south1-b",
    "us-south1-c",
    "asia-east1-a",
    "asia-east1-b",
    "asia-east1-c",
    "asia-northeast1-b",
    "asia-southeast1-a",
    "asia-southeast1-b",
    "asia-southeast1-c",
];

/// Zones to try, in order.
///
/// A requested zone wins; otherwise the configured list, otherwise
/// [`DEFAULT_ZONES`].
pub fn candidate_zones(requested: Option<&str>, configured: Option<&[String]>) -> Vec<String> {
    if let Some(zone) = requested {
        return vec![zone.to_string()];
    }
    match configured {
        Some(zones) if !zones.is_empty() => zones.to_vec(),
        _ => DEFAULT_ZONES.iter().map(|z| z.to_string()).collect(),
    }
}
