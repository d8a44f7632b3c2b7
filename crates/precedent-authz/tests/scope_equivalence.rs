use precedent_authz::{
    Action, Actor, Decision, DenyReason, GrantEdge, GrantError, GrantLookup, GrantSet,
    OrganizationId, RecordRef, ResourceKind, Role, UserId, authorize, scope_queryset,
    validate_grant,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

struct Fixture {
    actors: Vec<Actor>,
    edges: Vec<GrantEdge>,
    records: Vec<RecordRef>,
}

const OWNED_KINDS: [ResourceKind; 3] = [
    ResourceKind::Case,
    ResourceKind::Deadline,
    ResourceKind::Contact,
];

fn build_fixture(seed: u64) -> Fixture {
    let mut rng = StdRng::seed_from_u64(seed);
    let orgs: Vec<OrganizationId> = (0..3).map(|_| OrganizationId::new()).collect();

    let mut actors = vec![Actor::new(UserId::new(), None, Role::PlatformAdmin)];
    for org in &orgs {
        for role in &Role::ALL[1..] {
            for _ in 0..2 {
                let mut actor = Actor::new(UserId::new(), Some(*org), *role);
                if rng.gen_bool(0.1) {
                    actor = actor.inactive();
                }
                actors.push(actor);
            }
        }
    }

    let admin_of = |org: OrganizationId| {
        actors
            .iter()
            .copied()
            .find(|a| a.role == Role::TenantAdmin && a.organization_id == Some(org))
    };
    let mut edges = Vec::new();
    for _ in 0..40 {
        let grantee = *actors.choose(&mut rng).expect("actors");
        let target = *actors.choose(&mut rng).expect("actors");
        let Some(org) = grantee.organization_id else {
            continue;
        };
        let Some(admin) = admin_of(org) else {
            continue;
        };
        if validate_grant(&admin, &grantee, &target).is_ok() {
            edges.push(GrantEdge {
                grantee: grantee.id,
                target: target.id,
                organization_id: org,
                active: rng.gen_bool(0.75),
            });
        }
    }

    let mut records = Vec::new();
    for _ in 0..200 {
        let kind = OWNED_KINDS[rng.gen_range(0..OWNED_KINDS.len())];
        let org = orgs[rng.gen_range(0..orgs.len())];
        let owner = if rng.gen_bool(0.1) {
            None
        } else {
            actors.choose(&mut rng).map(|a| a.id)
        };
        records.push(RecordRef::owned(kind, org, owner));
    }
    for actor in &actors {
        records.push(RecordRef::account(actor.id, actor.organization_id, actor.role));
    }
    for org in &orgs {
        records.push(RecordRef::organization(*org));
        records.push(RecordRef::subscription(*org));
        records.push(RecordRef::audit_event(Some(*org)));
    }
    records.push(RecordRef::audit_event(None));
    for kind in [ResourceKind::Court, ResourceKind::Judge, ResourceKind::HolidayCalendar] {
        records.push(RecordRef::reference(kind));
    }

    Fixture {
        actors,
        edges,
        records,
    }
}

#[test]
fn scope_matches_view_decision_for_every_record() {
    for seed in [7_u64, 42, 1337] {
        let fixture = build_fixture(seed);
        for actor in &fixture.actors {
            let grants = GrantSet::for_actor(actor, &fixture.edges);
            for kind in ResourceKind::ALL {
                let scope = scope_queryset(actor, &grants, kind);
                for record in fixture.records.iter().filter(|r| r.kind == kind) {
                    let decision = authorize(actor, &grants, Action::View, record);
                    assert_eq!(
                        scope.matches(record),
                        decision.is_allowed(),
                        "seed {seed} role {} kind {kind}: decision {decision:?}",
                        actor.role
                    );
                }
            }
        }
    }
}

#[test]
fn raw_edges_and_grant_set_agree() {
    let fixture = build_fixture(99);
    for actor in fixture.actors.iter().filter(|a| a.organization_id.is_some()) {
        let grants = GrantSet::for_actor(actor, &fixture.edges);
        assert_eq!(
            grants.visible_to(actor.id),
            fixture.edges.visible_to(actor.id)
        );
    }
}

#[test]
fn platform_admin_is_allowed_every_action() {
    let fixture = build_fixture(3);
    let platform = fixture.actors[0];
    assert_eq!(platform.role, Role::PlatformAdmin);
    let actions = [
        Action::View,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::ManageGrants,
    ];
    for record in &fixture.records {
        for action in actions {
            assert_eq!(
                authorize(&platform, &fixture.edges, action, record),
                Decision::Allow
            );
        }
    }
}

#[test]
fn lower_roles_never_cross_tenants() {
    let fixture = build_fixture(11);
    for actor in fixture.actors.iter().filter(|a| a.active && !a.role.is_admin()) {
        for record in fixture
            .records
            .iter()
            .filter(|r| r.organization_id.is_some() && r.organization_id != actor.organization_id)
        {
            let decision = authorize(actor, &fixture.edges, Action::View, record);
            assert_eq!(decision, Decision::Deny(DenyReason::CrossTenant));
        }
    }
}

#[test]
fn active_grants_allow_viewing_target_records() {
    let fixture = build_fixture(5);
    for edge in fixture.edges.iter().filter(|e| e.active) {
        let Some(grantee) = fixture
            .actors
            .iter()
            .find(|a| a.id == edge.grantee && a.active)
        else {
            continue;
        };
        let record = RecordRef::owned(ResourceKind::Case, edge.organization_id, Some(edge.target));
        assert!(authorize(grantee, &fixture.edges, Action::View, &record).is_allowed());
    }
}

#[test]
fn revoking_a_grant_takes_effect_immediately() {
    let org = OrganizationId::new();
    let admin = Actor::new(UserId::new(), Some(org), Role::TenantAdmin);
    let grantee = Actor::new(UserId::new(), Some(org), Role::ManagingPractitioner);
    let target = Actor::new(UserId::new(), Some(org), Role::Practitioner);
    let organization_id = validate_grant(&admin, &grantee, &target).expect("valid grant");
    let mut edges = vec![GrantEdge {
        grantee: grantee.id,
        target: target.id,
        organization_id,
        active: true,
    }];
    let record = RecordRef::owned(ResourceKind::Deadline, org, Some(target.id));
    assert!(authorize(&grantee, &edges, Action::View, &record).is_allowed());

    edges[0].active = false;
    assert_eq!(
        authorize(&grantee, &edges, Action::View, &record),
        Decision::Deny(DenyReason::NotAuthorized)
    );
}

#[test]
fn role_incompatibility_wins_over_rank() {
    let org = OrganizationId::new();
    let managing = Actor::new(UserId::new(), Some(org), Role::ManagingPractitioner);
    let practitioner = Actor::new(UserId::new(), Some(org), Role::Practitioner);
    let tenant_admin = Actor::new(UserId::new(), Some(org), Role::TenantAdmin);
    assert!(matches!(
        validate_grant(&managing, &practitioner, &tenant_admin),
        Err(GrantError::RoleIncompatible { .. })
    ));
}
