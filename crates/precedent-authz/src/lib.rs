//! Precedent access-control engine shared by the practice service.
//!
//! # Purpose
//! Decides, for an authenticated actor and a target record, whether the actor
//! may view, create, change, or delete it, and builds the equivalent bulk
//! filter for list queries. The crate is pure: it performs no I/O and keeps
//! no state between calls.
//!
//! # How it fits
//! The service loads the actor and the actor's active grants per request,
//! converts stored rows into [`RecordRef`] views, and calls [`authorize`] for
//! single-record operations or [`scope_queryset`] for listings.
//!
//! # Key invariants
//! - Roles form a strict five-tier ranking; admin tiers are never grant targets.
//! - Only platform administrators cross organization boundaries.
//! - [`Scope::matches`] agrees with [`authorize`] for [`Action::View`] on every
//!   record.
//!
//! # Examples
//! ```rust
//! use precedent_authz::{
//!     authorize, scope_queryset, Action, Actor, GrantEdge, GrantSet, OrganizationId, RecordRef,
//!     ResourceKind, Role, UserId,
//! };
//!
//! let org = OrganizationId::new();
//! let assistant = Actor::new(UserId::new(), Some(org), Role::Assistant);
//! let practitioner = UserId::new();
//! let edges = [GrantEdge {
//!     grantee: assistant.id,
//!     target: practitioner,
//!     organization_id: org,
//!     active: true,
//! }];
//! let grants = GrantSet::for_actor(&assistant, edges.iter());
//!
//! let case = RecordRef::owned(ResourceKind::Case, org, Some(practitioner));
//! assert!(authorize(&assistant, &grants, Action::View, &case).is_allowed());
//! assert!(scope_queryset(&assistant, &grants, ResourceKind::Case).matches(&case));
//! ```
//!
//! # Common pitfalls
//! - Building a [`GrantSet`] for one actor and evaluating another returns no
//!   grant matches.
//! - Records with a missing organization are outside every tenant.

mod action;
mod decision;
mod errors;
mod evaluator;
mod grant;
mod resource;
mod role;
mod scope;
mod tenant;
mod types;

pub use action::Action;
pub use decision::{Decision, DenyReason};
pub use errors::{AuthzError, AuthzResult};
pub use evaluator::{Target, authorize};
pub use grant::{GrantEdge, GrantError, GrantLookup, GrantParty, GrantSet, validate_grant};
pub use resource::{OwnedRecord, Ownership, RecordRef, ResourceKind};
pub use role::Role;
pub use scope::{Scope, scope_queryset};
pub use tenant::{Actor, same_tenant};
pub use types::{OrganizationId, UserId};
