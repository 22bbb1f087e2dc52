//! Protocol module - the two-layer binary wire format.
//!
//! - Package framing: the outer control/data envelope
//! - Message framing: request/notify/response/push inside Data packages
//! - Route dictionary: string <-> code compression negotiated at handshake

mod message;
mod packet;
mod route;

pub use message::{
    flags, Message, MessageKind, Route, MSG_FLAG_BYTES, MSG_ROUTE_CODE_BYTES, MSG_ROUTE_LEN_BYTES,
    MSG_ROUTE_MAX_BYTES,
};
pub use packet::{Packet, PacketKind, PKG_BODY_MAX, PKG_HEAD_BYTES};
pub use route::RouteDictionary;
