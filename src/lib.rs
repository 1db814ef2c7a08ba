//! TSCH schedule model, Orchestra autonomous scheduler and routing table
//! for a IEEE 802.15.4-2015 Time-Slotted Channel Hopping network simulator.
//!
//! This crate is the link-layer scheduling core of a larger discrete-event
//! simulator. The simulator loop, link/PHY model, configuration file
//! loader, statistics aggregation and CLI live outside this crate; it is
//! driven entirely by the callbacks on [`node::NodeState`].

#[macro_use]
pub(crate) mod utils;

pub mod addr;
pub mod asn;
pub mod cell;
pub mod config;
pub mod error;
pub mod node;
pub mod orchestra;
pub mod packet;
pub mod routing;
pub mod schedule;
pub mod slotframe;

pub use addr::Addr;
pub use asn::AbsoluteSlotNumber;
pub use cell::{Cell, CellOptions, CellType, NeighborId};
pub use config::Config;
pub use error::CoreError;
pub use node::NodeState;
pub use packet::{FrameType, Packet, PacketAttrs};
pub use routing::{Route, RoutingTable};
pub use schedule::Schedule;
pub use slotframe::Slotframe;
