//! Inbound commands to the counter service.
//!
//! Produced by the remote command decoder ([`crate::rpc::command::decode`])
//! and interpreted by
//! [`CounterService::handle_command`](super::service::CounterService::handle_command).

/// Actions a remote controller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Change the publish period (hours).
    SetPeriod(u8),
    /// Publish now. Answered by the telemetry frame itself, not a reply.
    Poll,
    /// Zero every counter.
    Reset,
}
