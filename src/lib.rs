//! Map Render Coordinator
//!
//! Turns block-change notifications from a game server into a deduplicated
//! queue of map tile re-renders, and relays player chat and presence to the
//! web map.
//!
//! ## Architecture
//!
//! ```text
//! MapBusAgent  (bus.rs)       ← dispatch tick loop, inbound web chat
//!   ├── Dispatcher  (dispatch.rs) → TileRenderer (external)
//!   └── MapService  (service.rs)  ← implements MapApi (api.rs)
//!         ├── TileMapper        (mapper.rs)
//!         ├── RenderQueue       (queue.rs)
//!         ├── PauseGate         (gate.rs)
//!         ├── PlayerVisibility  (visibility.rs)
//!         ├── WebRelay          (relay.rs) → WebChannel (external)
//!         ├── WebChatBus        (chat.rs)
//!         └── MarkerSlot        (markers.rs)
//! ```
//!
//! Hosts that hand out native location/player objects wrap the service in a
//! [`host::HostAdapter`].

// Data types, errors, the wire protocol and tile mapping are always available.
pub mod error;
pub mod mapper;
pub mod protocol;
pub mod types;

// Runtime modules require the `server` feature.
#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod bus;
#[cfg(feature = "server")]
pub mod chat;
#[cfg(feature = "server")]
pub mod dispatch;
#[cfg(feature = "server")]
pub mod gate;
#[cfg(feature = "server")]
pub mod host;
#[cfg(feature = "server")]
pub mod markers;
#[cfg(feature = "server")]
pub mod queue;
#[cfg(feature = "server")]
pub mod relay;
#[cfg(feature = "server")]
pub mod service;
#[cfg(feature = "server")]
pub mod visibility;

// Convenience re-exports (server only)
#[cfg(feature = "server")]
pub use api::MapApi;
#[cfg(feature = "server")]
pub use bus::{MapBusAgent, MapBusConfig};
#[cfg(feature = "server")]
pub use chat::{ListenerVerdict, WebChatEvent, WebChatListener, WebChatOutcome};
#[cfg(feature = "server")]
pub use dispatch::{DispatchReport, Dispatcher, TileRenderer};
#[cfg(feature = "server")]
pub use relay::{BroadcastWebChannel, WebChannel, WebFrame};
#[cfg(feature = "server")]
pub use service::MapService;
pub use error::MapError;
pub use mapper::TileMapper;
pub use types::{
    BlockPos, CoordinatorConfig, JobClass, MapStats, RenderJob, TileId, WorldConfig, WorldVolume,
};
