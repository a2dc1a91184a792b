//! # `corkboard_client`
//!
//! Client bootstrap layer for Corkboard, a collaborative sticky-note board.
//!
//! The actual hard problems (conflict-free merging, operation ordering,
//! persistence) belong to an external real-time collaboration framework and
//! its storage driver; this crate configures and wires them. It owns four
//! things:
//!
//! 1. A constructor-injected [`token::TokenCache`] plus the two token fetch
//!    adapters the framework's document-service factory expects
//!    ([`token::TokenProvider`]).
//! 2. The [`audience::Audience`] adapter that turns raw provider user records
//!    into validated board members for the presence list.
//! 3. The [`bootstrap::BoardBootstrap`] orchestrator that decides
//!    create-vs-join from the page fragment, drives the framework loader to a
//!    live attached document, and derives the [`bootstrap::BoardServices`]
//!    façade.
//! 4. The [`container::BoardContainer`] wrapper that enforces the attach
//!    contract and offers the one-shot connected wait the view shell needs
//!    before first render.
//!
//! The collaboration framework, the identity provider, the client-local link
//! store, and the page location are all trait seams (see [`loader`],
//! [`token::IdentityFlow`], [`bootstrap::LinkStore`],
//! [`bootstrap::PageLocation`]) implemented by the embedding application.

#![warn(missing_docs)]

pub mod audience;
pub mod board;
pub mod bootstrap;
pub mod container;
pub mod error;
pub mod loader;
pub mod token;

pub use audience::{Audience, BoardMember};
pub use board::{NoteColor, NoteData, board_schema};
pub use bootstrap::{BoardBootstrap, BoardServices, BootstrapOutcome, LinkStore, PageLocation};
pub use container::BoardContainer;
pub use error::{BootstrapError, Result};
pub use loader::{AttachState, ConnectionState, ContainerLoader, DocumentHandle};
pub use token::{IdentityFlow, TokenCache, TokenKind, TokenProvider};
