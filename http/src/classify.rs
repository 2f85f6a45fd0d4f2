//! Mapping transport failures onto [`ErrorKind`]

use loadgen_core::ErrorKind;
use std::error::Error as StdError;
use std::io;

const TLS_MARKERS: [&str; 4] = ["certificate", "tls", "ssl", "handshake"];

/// Classify a failed request or body read
///
/// Checked in order: timeout, TLS, connection, other. TLS failures surface
/// from reqwest as connect errors, so they are looked for first.
pub fn classify_error(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        return ErrorKind::Timeout;
    }

    if chain_mentions_tls(err) {
        return ErrorKind::Tls;
    }

    if err.is_connect() || chain_has_io_kind(err, is_connection_io_kind) {
        return ErrorKind::Connection;
    }

    if chain_has_io_kind(err, |kind| kind == io::ErrorKind::TimedOut) {
        return ErrorKind::Timeout;
    }

    ErrorKind::Other
}

fn is_connection_io_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
    )
}

fn sources(err: &reqwest::Error) -> impl Iterator<Item = &(dyn StdError + 'static)> + '_ {
    std::iter::successors(err.source(), |&e| e.source())
}

fn chain_mentions_tls(err: &reqwest::Error) -> bool {
    // rustls reports handshake failures as io::ErrorKind::InvalidData
    let invalid_data_on_connect =
        err.is_connect() && chain_has_io_kind(err, |kind| kind == io::ErrorKind::InvalidData);

    invalid_data_on_connect
        || sources(err).any(|e| {
            let message = e.to_string().to_ascii_lowercase();
            TLS_MARKERS.iter().any(|marker| message.contains(marker))
        })
}

fn chain_has_io_kind(err: &reqwest::Error, pred: impl Fn(io::ErrorKind) -> bool) -> bool {
    sources(err)
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .any(|io_err| pred(io_err.kind()))
}
