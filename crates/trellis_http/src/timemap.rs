//! I define the memento uri helpers and the time map renderings.
//!

use chrono::{DateTime, SecondsFormat, Utc};
use ldp_typed_headers::link::LinkValue;
use trellis_api::model::{Quad, Resource};
use trellis_vocab::{memento, ns, term};

/// The version uri of a memento, `<bare_url>?version=<epoch_millis>`.
/// This form is load bearing for clients; every memento uri goes
/// through here.
pub fn version_url(external_url: &str, instant: DateTime<Utc>) -> String {
    format!("{}?version={}", external_url, instant.timestamp_millis())
}

/// The time map uri of a resource.
pub fn timemap_url(external_url: &str) -> String {
    format!("{}?ext=timemap", external_url)
}

/// Render the link-format body of a time map: the same links the
/// response headers carry, comma newline separated.
pub fn link_format_body(links: &[LinkValue]) -> String {
    links
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(",\n")
}

/// The time map as a graph, for the json-ld rendering: the time
/// map node and one memento node per version range.
pub fn timemap_quads(resource: &Resource, external_url: &str) -> Vec<Quad> {
    let timemap_term = term::iri(timemap_url(external_url));
    let type_term = term::iri(ns::rdf::type_.to_string());
    let datetime_dt = ns::xsd::dateTime.to_string();

    let mut quads: Vec<Quad> = vec![(
        [
            timemap_term.clone(),
            type_term.clone(),
            term::iri(memento::TimeMap),
        ],
        None,
    )];

    for range in &resource.mementos {
        let memento_term = term::iri(version_url(external_url, range.from));
        quads.push((
            [memento_term.clone(), type_term.clone(), term::iri(memento::Memento)],
            None,
        ));
        quads.push((
            [
                memento_term.clone(),
                term::iri(memento::original),
                term::iri(external_url.to_owned()),
            ],
            None,
        ));
        quads.push((
            [
                memento_term,
                term::iri(memento::mementoDatetime),
                term::literal_dt(
                    range.until.to_rfc3339_opts(SecondsFormat::Secs, true),
                    &datetime_dt,
                ),
            ],
            None,
        ));
    }

    quads
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use claims::assert_ok;
    use std::str::FromStr;

    use super::*;

    #[test]
    fn version_url_uses_epoch_millis() {
        let instant = Utc.timestamp_opt(1496262729, 0).unwrap();
        assert_eq!(
            version_url("http://example.org/repo1/resource", instant),
            "http://example.org/repo1/resource?version=1496262729000"
        );
    }

    #[test]
    fn link_format_body_is_the_header_link_set() {
        let links = vec![
            assert_ok!(LinkValue::try_new_basic(
                "http://example.org/repo1/resource",
                "original"
            )),
            assert_ok!(LinkValue::try_new_basic(
                "http://example.org/repo1/resource?ext=timemap",
                "timemap"
            )),
        ];
        let body = link_format_body(&links);
        assert_eq!(body.lines().count(), 2);

        for line in body.lines() {
            let line = line.trim_end_matches(',');
            assert_ok!(LinkValue::from_str(line));
        }
    }
}
