// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! max-wire: the RPC wire protocol — request/response DTOs, newline-
//! delimited JSON framing, and the `Transport` abstraction (`spec.md`
//! §4.2, §4.3, §6).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod framing;
pub mod message;
pub mod transport;

pub use framing::{read_frame, write_frame, FramingError};
pub use message::{Frame, PromptMessage, Request, RequestScope, Response};
pub use transport::{
    Dispatch, LoopbackTransport, ScopedTransport, Transport, TransportError, TransportKind,
    UnixSocketServer, UnixSocketTransport,
};
