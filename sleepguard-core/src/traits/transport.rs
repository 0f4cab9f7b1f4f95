//! Report dispatch
//!
//! The arbiter hands exactly one [`Report`] per wake to the transport. How it
//! reaches the gateway (CoAP over Thread, UDP, a serial bridge) is the
//! transport's concern.
//!
//! Failures are not fatal: the arbiter logs them and carries on with the
//! cycle. A lost report is not retried within the same wake; the next
//! scheduled report is the only retry. Implementations should not add their
//! own retry loops either, since every retransmission costs radio-on time.

use core::fmt::Debug;

use crate::report::Report;

/// Sends one report to a destination
pub trait ReportTransport {
    /// Where reports are sent (socket address, resource path, ...)
    type Destination;

    /// Transport-specific failure
    type Error: Debug;

    /// Send `report` to `destination`, blocking until acknowledged or failed
    fn send_report(
        &mut self,
        report: &Report,
        destination: &Self::Destination,
    ) -> Result<(), Self::Error>;
}
