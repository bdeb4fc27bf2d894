// src/core/scanner/candidates.rs

use crate::core::models::{CandidateUrl, Host, LocationStrategy, Protocol};

/// Builds the ordered probe list for one host under one location strategy.
///
/// Protocols iterate in priority order (outer loop), resource paths in their
/// configured order (inner loop), so the plaintext fallback for a given path
/// always comes after every encrypted attempt. Pure data transformation:
/// identical inputs always yield the identical ordered list.
pub fn build_candidates(
    host: &Host,
    location: &LocationStrategy,
    resource_paths: &[String],
    protocols: &[Protocol],
) -> Vec<CandidateUrl> {
    let mut candidates = Vec::with_capacity(protocols.len() * resource_paths.len());

    for protocol in protocols {
        let base = match location {
            LocationStrategy::Root => format!("{}{}", protocol.prefix(), host),
            LocationStrategy::Folder(folder) => {
                format!("{}{}/{}", protocol.prefix(), host, folder)
            }
            LocationStrategy::Subdomain(subdomain) => {
                format!("{}{}.{}", protocol.prefix(), subdomain, host)
            }
        };

        for resource_path in resource_paths {
            candidates.push(CandidateUrl {
                url: format!("{base}{resource_path}"),
                resource_path: resource_path.clone(),
            });
        }
    }

    candidates
}
