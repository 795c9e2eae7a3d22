use chrono::NaiveDate;
use roster::db::*;
use roster::error::RosterError;
use roster::model::*;
use roster::ops::*;
use roster::queries::*;

fn setup() -> (rusqlite::Connection, User) {
    let conn = schema::test_connection();
    let user = User::create("Organizer".into(), "organizer@example.org".into());
    (conn, user)
}

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn add_member(conn: &rusqlite::Connection, user: &User, first_name: &str) -> Member {
    member_ops::create_member(
        conn,
        Some(user),
        NewMember {
            first_name: first_name.into(),
            last_name: "Jansen".into(),
            ..Default::default()
        },
    )
    .unwrap()
}

fn add_group(conn: &rusqlite::Connection, user: &User, name: &str) -> MemberGroup {
    group_ops::create_group(conn, Some(user), name, Some("#3366ff"), None, vec![]).unwrap()
}

/// Every edge must be visible from both the member and the group side.
fn assert_membership_symmetric(conn: &rusqlite::Connection) {
    let members = member_queries::all_members(conn).unwrap();
    let groups = member_queries::all_groups(conn).unwrap();
    for m in &members {
        for g in &m.group_ids {
            let group = groups.iter().find(|x| x.id == *g).unwrap();
            assert!(group.member_ids.contains(&m.id));
        }
    }
    for g in &groups {
        for m in &g.member_ids {
            let member = members.iter().find(|x| x.id == *m).unwrap();
            assert!(member.group_ids.contains(&g.id));
        }
    }
}

/// Weekly series 2024-01-01 .. 2024-01-22. Returns the head id and all
/// four activities ordered by date.
fn weekly_series(conn: &rusqlite::Connection, user: &User) -> (Id<Activity>, Vec<Activity>) {
    let mut new = NewActivity::recurring("Training", d(1, 1), RecurrenceRule::Weekly, d(1, 22));
    new.location = Some("Room A".into());
    let head_id = activity_ops::create_activity(conn, Some(user), new).unwrap();
    let all = activity_queries::activities_in_range(conn, d(1, 1), d(12, 31)).unwrap();
    (head_id, all)
}

fn on(activities: &[Activity], date: NaiveDate) -> Activity {
    activities.iter().find(|a| a.date == date).unwrap().clone()
}

fn reload(conn: &rusqlite::Connection) -> Vec<Activity> {
    activity_queries::activities_in_range(conn, d(1, 1), d(12, 31)).unwrap()
}

// ==========================================================================
// MEMBERSHIP DIRECTORY
// ==========================================================================

#[test]
fn add_member_to_group_links_both_sides() {
    let (conn, user) = setup();
    let group = add_group(&conn, &user, "Juniors");
    let member = add_member(&conn, &user, "Eva");

    let group = group_ops::add_member_to_group(&conn, Some(&user), group.id, member.id).unwrap();
    assert_eq!(group.member_ids, vec![member.id]);

    let member = member_queries::find_member(&conn, member.id).unwrap().unwrap();
    assert_eq!(member.group_ids, vec![group.id]);
    assert_membership_symmetric(&conn);
}

#[test]
fn add_member_to_group_is_idempotent() {
    let (conn, user) = setup();
    let group = add_group(&conn, &user, "Juniors");
    let member = add_member(&conn, &user, "Eva");

    group_ops::add_member_to_group(&conn, Some(&user), group.id, member.id).unwrap();
    let group = group_ops::add_member_to_group(&conn, Some(&user), group.id, member.id).unwrap();

    assert_eq!(group.member_ids.len(), 1);
    assert_membership_symmetric(&conn);
}

#[test]
fn add_member_to_missing_group_is_not_found() {
    let (conn, user) = setup();
    let member = add_member(&conn, &user, "Eva");

    let result = group_ops::add_member_to_group(&conn, Some(&user), Id::generate(), member.id);
    assert!(matches!(result, Err(RosterError::NotFound { .. })));
}

#[test]
fn add_missing_member_to_group_is_not_found() {
    let (conn, user) = setup();
    let group = add_group(&conn, &user, "Juniors");

    let result = group_ops::add_member_to_group(&conn, Some(&user), group.id, Id::generate());
    assert!(matches!(result, Err(RosterError::NotFound { .. })));
    assert!(member_queries::find_group(&conn, group.id).unwrap().unwrap().member_ids.is_empty());
}

#[test]
fn remove_member_from_group_is_idempotent() {
    let (conn, user) = setup();
    let group = add_group(&conn, &user, "Juniors");
    let member = add_member(&conn, &user, "Eva");
    group_ops::add_member_to_group(&conn, Some(&user), group.id, member.id).unwrap();

    group_ops::remove_member_from_group(&conn, Some(&user), group.id, member.id).unwrap();
    let group = group_ops::remove_member_from_group(&conn, Some(&user), group.id, member.id).unwrap();

    assert!(group.member_ids.is_empty());
    let member = member_queries::find_member(&conn, member.id).unwrap().unwrap();
    assert!(member.group_ids.is_empty());
    assert_membership_symmetric(&conn);
}

#[test]
fn delete_group_strips_it_from_members_but_keeps_them() {
    let (conn, user) = setup();
    let juniors = add_group(&conn, &user, "Juniors");
    let seniors = add_group(&conn, &user, "Seniors");
    let eva = add_member(&conn, &user, "Eva");
    let tom = add_member(&conn, &user, "Tom");
    group_ops::set_group_members(&conn, Some(&user), juniors.id, &[eva.id, tom.id]).unwrap();
    group_ops::add_member_to_group(&conn, Some(&user), seniors.id, tom.id).unwrap();

    group_ops::delete_group(&conn, Some(&user), juniors.id).unwrap();

    assert!(member_queries::find_group(&conn, juniors.id).unwrap().is_none());
    let eva = member_queries::find_member(&conn, eva.id).unwrap().unwrap();
    let tom = member_queries::find_member(&conn, tom.id).unwrap().unwrap();
    assert!(eva.group_ids.is_empty());
    assert_eq!(tom.group_ids, vec![seniors.id]);
    assert_membership_symmetric(&conn);
}

#[test]
fn delete_group_drops_it_from_activity_targets() {
    let (conn, user) = setup();
    let juniors = add_group(&conn, &user, "Juniors");
    let mut new = NewActivity::single("Tournament", d(5, 4));
    new.target_group_ids = vec![juniors.id];
    let activity_id = activity_ops::create_activity(&conn, Some(&user), new).unwrap();

    group_ops::delete_group(&conn, Some(&user), juniors.id).unwrap();

    let activity = activity_queries::find_activity(&conn, activity_id).unwrap().unwrap();
    assert!(activity.target_group_ids.is_empty());
}

#[test]
fn update_member_reconciles_full_group_set() {
    let (conn, user) = setup();
    let g1 = add_group(&conn, &user, "Juniors");
    let g2 = add_group(&conn, &user, "Choir");
    let g3 = add_group(&conn, &user, "Board");
    let member = member_ops::create_member(
        &conn,
        Some(&user),
        NewMember {
            first_name: "Eva".into(),
            group_ids: vec![g1.id, g2.id],
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(member.group_ids, vec![g1.id, g2.id]);

    let updated = member_ops::update_member(
        &conn,
        Some(&user),
        member.id,
        MemberPatch {
            group_ids: Some(vec![g2.id, g3.id, g3.id]),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(updated.group_ids, vec![g2.id, g3.id]);
    assert!(member_queries::members_of_group(&conn, g1.id).unwrap().is_empty());
    assert_eq!(member_queries::members_of_group(&conn, g3.id).unwrap().len(), 1);
    assert_membership_symmetric(&conn);
}

#[test]
fn update_member_without_group_ids_keeps_membership() {
    let (conn, user) = setup();
    let g1 = add_group(&conn, &user, "Juniors");
    let member = add_member(&conn, &user, "Eva");
    group_ops::add_member_to_group(&conn, Some(&user), g1.id, member.id).unwrap();

    let updated = member_ops::update_member(
        &conn,
        Some(&user),
        member.id,
        MemberPatch {
            phone: Some(Some(" 06-12345678 ".into())),
            guardian_name: Some(Some("Karin Jansen".into())),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(updated.phone, Some("06-12345678".into()));
    assert_eq!(updated.guardian_name, Some("Karin Jansen".into()));
    assert_eq!(updated.group_ids, vec![g1.id]);
}

#[test]
fn failed_member_update_leaves_nothing_behind() {
    let (conn, user) = setup();
    let g1 = add_group(&conn, &user, "Juniors");
    let member = add_member(&conn, &user, "Eva");
    group_ops::add_member_to_group(&conn, Some(&user), g1.id, member.id).unwrap();

    let result = member_ops::update_member(
        &conn,
        Some(&user),
        member.id,
        MemberPatch {
            first_name: Some("Evelien".into()),
            group_ids: Some(vec![Id::generate()]),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(RosterError::NotFound { .. })));

    let member = member_queries::find_member(&conn, member.id).unwrap().unwrap();
    assert_eq!(member.first_name, "Eva");
    assert_eq!(member.group_ids, vec![g1.id]);
}

#[test]
fn set_group_members_replaces_list() {
    let (conn, user) = setup();
    let group = add_group(&conn, &user, "Juniors");
    let eva = add_member(&conn, &user, "Eva");
    let tom = add_member(&conn, &user, "Tom");
    let noor = add_member(&conn, &user, "Noor");

    group_ops::set_group_members(&conn, Some(&user), group.id, &[eva.id, tom.id]).unwrap();
    let group = group_ops::set_group_members(&conn, Some(&user), group.id, &[tom.id, noor.id]).unwrap();

    assert_eq!(group.member_ids, vec![tom.id, noor.id]);
    let eva = member_queries::find_member(&conn, eva.id).unwrap().unwrap();
    assert!(eva.group_ids.is_empty());
    assert_membership_symmetric(&conn);
}

#[test]
fn create_group_with_unknown_member_is_rejected() {
    let (conn, user) = setup();
    let result = group_ops::create_group(&conn, Some(&user), "Juniors", None, None, vec![Id::generate()]);
    assert!(matches!(result, Err(RosterError::NotFound { .. })));
    assert!(member_queries::all_groups(&conn).unwrap().is_empty());
}

#[test]
fn create_member_rejects_blank_name() {
    let (conn, user) = setup();
    let result = member_ops::create_member(
        &conn,
        Some(&user),
        NewMember {
            first_name: "   ".into(),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(RosterError::BlankField { .. })));
}

#[test]
fn create_member_requires_caller() {
    let (conn, _) = setup();
    let result = member_ops::create_member(
        &conn,
        None,
        NewMember {
            first_name: "Eva".into(),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(RosterError::Unauthenticated)));
}

#[test]
fn deactivate_and_reactivate_member() {
    let (conn, user) = setup();
    let group = add_group(&conn, &user, "Juniors");
    let member = add_member(&conn, &user, "Eva");
    group_ops::add_member_to_group(&conn, Some(&user), group.id, member.id).unwrap();

    let inactive = member_ops::deactivate_member(&conn, Some(&user), member.id).unwrap();
    assert!(!inactive.is_active);
    assert_eq!(inactive.group_ids, vec![group.id]);
    assert!(member_queries::active_members(&conn).unwrap().is_empty());

    let active = member_ops::reactivate_member(&conn, Some(&user), member.id).unwrap();
    assert!(active.is_active);
}

// ==========================================================================
// RECURRING ACTIVITY SCHEDULER
// ==========================================================================

#[test]
fn weekly_series_is_expanded_eagerly() {
    let (conn, user) = setup();
    let (head_id, all) = weekly_series(&conn, &user);

    assert_eq!(all.len(), 4);
    let dates: Vec<NaiveDate> = all.iter().map(|a| a.date).collect();
    assert_eq!(dates, vec![d(1, 1), d(1, 8), d(1, 15), d(1, 22)]);

    let head = on(&all, d(1, 1));
    assert_eq!(head.id, head_id);
    assert!(head.is_head());
    assert_eq!(head.parent_activity_id, None);

    for instance in all.iter().filter(|a| a.id != head_id) {
        assert_eq!(instance.parent_activity_id, Some(head_id));
        assert_eq!(instance.kind, ActivityKind::Single);
        assert_eq!(instance.location, Some("Room A".into()));
        assert_eq!(instance.created_by, user.id);
    }
}

#[test]
fn instances_copy_targets_of_head() {
    let (conn, user) = setup();
    let group = add_group(&conn, &user, "Juniors");
    let eva = add_member(&conn, &user, "Eva");
    let mut new = NewActivity::recurring("Training", d(1, 1), RecurrenceRule::Biweekly, d(1, 31));
    new.target_group_ids = vec![group.id];
    new.target_member_ids = vec![eva.id];
    let head_id = activity_ops::create_activity(&conn, Some(&user), new).unwrap();

    let series = activity_queries::series(&conn, head_id).unwrap();
    assert_eq!(series.dates(), vec![d(1, 1), d(1, 15), d(1, 29)]);
    for instance in &series.instances {
        assert_eq!(instance.target_group_ids, vec![group.id]);
        assert_eq!(instance.target_member_ids, vec![eva.id]);
    }
}

#[test]
fn monthly_series_clamps_to_month_end() {
    let (conn, user) = setup();
    let head_id = activity_ops::create_activity(
        &conn,
        Some(&user),
        NewActivity::recurring("Board meeting", d(1, 31), RecurrenceRule::Monthly, d(4, 30)),
    )
    .unwrap();

    let series = activity_queries::series(&conn, head_id).unwrap();
    assert_eq!(series.dates(), vec![d(1, 31), d(2, 29), d(3, 31), d(4, 30)]);
}

#[test]
fn recurrence_end_before_start_is_rejected() {
    let (conn, user) = setup();
    let result = activity_ops::create_activity(
        &conn,
        Some(&user),
        NewActivity::recurring("Training", d(2, 1), RecurrenceRule::Weekly, d(1, 1)),
    );
    assert!(matches!(result, Err(RosterError::DateOrder { .. })));
}

#[test]
fn create_with_unknown_target_stores_nothing() {
    let (conn, user) = setup();
    let mut new = NewActivity::recurring("Training", d(1, 1), RecurrenceRule::Weekly, d(1, 22));
    new.target_group_ids = vec![Id::generate()];

    let result = activity_ops::create_activity(&conn, Some(&user), new);
    assert!(matches!(result, Err(RosterError::NotFound { .. })));
    assert!(reload(&conn).is_empty());
}

#[test]
fn create_activity_requires_caller() {
    let (conn, _) = setup();
    let result = activity_ops::create_activity(&conn, None, NewActivity::single("Open day", d(3, 2)));
    assert!(matches!(result, Err(RosterError::Unauthenticated)));
}

#[test]
fn update_instance_and_future_leaves_earlier_occurrences() {
    let (conn, user) = setup();
    let (_, before) = weekly_series(&conn, &user);
    let target = on(&before, d(1, 15));

    let patch = ActivityPatch {
        location: Some(Some("Room B".into())),
        ..Default::default()
    };
    activity_ops::update_activity(&conn, Some(&user), target.id, &patch, true).unwrap();

    let after = reload(&conn);
    assert_eq!(on(&after, d(1, 15)).location, Some("Room B".into()));
    assert_eq!(on(&after, d(1, 22)).location, Some("Room B".into()));
    assert_eq!(on(&after, d(1, 1)), on(&before, d(1, 1)));
    assert_eq!(on(&after, d(1, 8)), on(&before, d(1, 8)));
}

#[test]
fn update_head_with_future_reaches_every_instance() {
    let (conn, user) = setup();
    let (head_id, _) = weekly_series(&conn, &user);

    let patch = ActivityPatch {
        name: Some("Evening training".into()),
        color: Some(Some("#ff0000".into())),
        ..Default::default()
    };
    activity_ops::update_activity(&conn, Some(&user), head_id, &patch, true).unwrap();

    for activity in reload(&conn) {
        assert_eq!(activity.name, "Evening training");
        assert_eq!(activity.color, Some("#ff0000".into()));
    }
}

#[test]
fn update_without_future_changes_only_target() {
    let (conn, user) = setup();
    let (head_id, before) = weekly_series(&conn, &user);

    let patch = ActivityPatch {
        location: Some(Some("Room B".into())),
        ..Default::default()
    };
    let updated = activity_ops::update_activity(&conn, Some(&user), head_id, &patch, false).unwrap();
    assert_eq!(updated.location, Some("Room B".into()));

    let after = reload(&conn);
    for date in [d(1, 8), d(1, 15), d(1, 22)] {
        assert_eq!(on(&after, date), on(&before, date));
    }
}

#[test]
fn patched_date_is_not_fanned_out() {
    let (conn, user) = setup();
    let (_, before) = weekly_series(&conn, &user);
    let target = on(&before, d(1, 8));

    let patch = ActivityPatch {
        date: Some(d(1, 9)),
        location: Some(Some("Gym".into())),
        ..Default::default()
    };
    activity_ops::update_activity(&conn, Some(&user), target.id, &patch, true).unwrap();

    let after = reload(&conn);
    let dates: Vec<NaiveDate> = after.iter().map(|a| a.date).collect();
    assert_eq!(dates, vec![d(1, 1), d(1, 9), d(1, 15), d(1, 22)]);
    assert_eq!(on(&after, d(1, 15)).location, Some("Gym".into()));
    assert_eq!(on(&after, d(1, 1)).location, Some("Room A".into()));
}

#[test]
fn update_with_end_time_before_start_is_rejected() {
    let (conn, user) = setup();
    let mut new = NewActivity::single("Open day", d(3, 2));
    new.start_time = chrono::NaiveTime::from_hms_opt(10, 0, 0);
    let id = activity_ops::create_activity(&conn, Some(&user), new).unwrap();

    let patch = ActivityPatch {
        end_time: Some(chrono::NaiveTime::from_hms_opt(9, 0, 0)),
        ..Default::default()
    };
    let result = activity_ops::update_activity(&conn, Some(&user), id, &patch, false);
    assert!(matches!(result, Err(RosterError::DateOrder { .. })));
}

#[test]
fn update_unknown_activity_is_not_found() {
    let (conn, user) = setup();
    let result = activity_ops::update_activity(&conn, Some(&user), Id::generate(), &ActivityPatch::default(), true);
    assert!(matches!(result, Err(RosterError::NotFound { .. })));
}

#[test]
fn delete_head_with_recurring_removes_series_and_attendance() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let (head_id, all) = weekly_series(&conn, &user);
    for activity in &all {
        attendance_ops::mark(&conn, Some(&user), activity.id, eva.id, AttendanceStatus::Present, None).unwrap();
    }

    let removed = activity_ops::delete_activity(&conn, Some(&user), head_id, true).unwrap();

    assert_eq!(removed, 4);
    assert!(reload(&conn).is_empty());
    for activity in &all {
        assert_eq!(attendance_repo::count_by_activity(&conn, activity.id).unwrap(), 0);
    }
}

#[test]
fn delete_instance_with_recurring_keeps_earlier_occurrences() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let (head_id, all) = weekly_series(&conn, &user);
    let target = on(&all, d(1, 15));
    let last = on(&all, d(1, 22));
    attendance_ops::mark(&conn, Some(&user), last.id, eva.id, AttendanceStatus::Absent, None).unwrap();

    let removed = activity_ops::delete_activity(&conn, Some(&user), target.id, true).unwrap();

    assert_eq!(removed, 2);
    let after = reload(&conn);
    let dates: Vec<NaiveDate> = after.iter().map(|a| a.date).collect();
    assert_eq!(dates, vec![d(1, 1), d(1, 8)]);
    assert_eq!(on(&after, d(1, 8)).parent_activity_id, Some(head_id));
    assert_eq!(attendance_repo::count_by_activity(&conn, last.id).unwrap(), 0);
}

#[test]
fn delete_single_occurrence_leaves_rest_of_series() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let (head_id, all) = weekly_series(&conn, &user);
    let target = on(&all, d(1, 8));
    attendance_ops::mark(&conn, Some(&user), target.id, eva.id, AttendanceStatus::Present, None).unwrap();

    let removed = activity_ops::delete_activity(&conn, Some(&user), target.id, false).unwrap();

    assert_eq!(removed, 1);
    assert_eq!(attendance_repo::count_by_activity(&conn, target.id).unwrap(), 0);
    let series = activity_queries::series(&conn, head_id).unwrap();
    assert_eq!(series.dates(), vec![d(1, 1), d(1, 15), d(1, 22)]);
}

#[test]
fn deleting_head_alone_promotes_earliest_instance() {
    let (conn, user) = setup();
    let (head_id, all) = weekly_series(&conn, &user);

    activity_ops::delete_activity(&conn, Some(&user), head_id, false).unwrap();

    let after = reload(&conn);
    assert_eq!(after.len(), 3);
    let new_head = on(&after, d(1, 8));
    assert_eq!(new_head.id, on(&all, d(1, 8)).id);
    assert_eq!(new_head.parent_activity_id, None);
    assert_eq!(
        new_head.recurrence(),
        Some(Recurrence { rule: RecurrenceRule::Weekly, until: d(1, 22) })
    );
    for date in [d(1, 15), d(1, 22)] {
        assert_eq!(on(&after, date).parent_activity_id, Some(new_head.id));
    }
    for activity in after.iter().filter(|a| a.parent_activity_id.is_some()) {
        assert_eq!(activity.kind, ActivityKind::Single);
    }
}

#[test]
fn delete_unknown_activity_is_not_found() {
    let (conn, user) = setup();
    let result = activity_ops::delete_activity(&conn, Some(&user), Id::generate(), true);
    assert!(matches!(result, Err(RosterError::NotFound { .. })));
}

#[test]
fn shrinking_recurrence_end_removes_later_occurrences() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let (head_id, all) = weekly_series(&conn, &user);
    let last = on(&all, d(1, 22));
    attendance_ops::mark(&conn, Some(&user), last.id, eva.id, AttendanceStatus::Present, None).unwrap();

    let head = activity_ops::change_recurrence_end(&conn, Some(&user), head_id, d(1, 10)).unwrap();

    assert_eq!(head.recurrence().map(|r| r.until), Some(d(1, 10)));
    let series = activity_queries::series(&conn, head_id).unwrap();
    assert_eq!(series.dates(), vec![d(1, 1), d(1, 8)]);
    assert_eq!(attendance_repo::count_by_activity(&conn, last.id).unwrap(), 0);
}

#[test]
fn extending_recurrence_end_generates_new_occurrences_only() {
    let (conn, user) = setup();
    let (head_id, all) = weekly_series(&conn, &user);
    activity_ops::delete_activity(&conn, Some(&user), on(&all, d(1, 8)).id, false).unwrap();

    activity_ops::change_recurrence_end(&conn, Some(&user), head_id, d(2, 5)).unwrap();

    let series = activity_queries::series(&conn, head_id).unwrap();
    assert_eq!(
        series.dates(),
        vec![d(1, 1), d(1, 15), d(1, 22), d(1, 29), d(2, 5)]
    );
}

#[test]
fn changing_recurrence_end_of_single_activity_is_invalid() {
    let (conn, user) = setup();
    let id = activity_ops::create_activity(&conn, Some(&user), NewActivity::single("Open day", d(3, 2))).unwrap();

    let result = activity_ops::change_recurrence_end(&conn, Some(&user), id, d(4, 1));
    assert!(matches!(result, Err(RosterError::InvalidState(_))));
}

#[test]
fn repair_generates_missing_instances_once() {
    let (conn, user) = setup();
    let mut legacy = Activity::create("Choir rehearsal".into(), d(1, 1), user.id);
    legacy.kind = ActivityKind::Recurring(Recurrence {
        rule: RecurrenceRule::Weekly,
        until: d(1, 22),
    });
    activity_repo::insert(&conn, &legacy).unwrap();
    weekly_series(&conn, &user);

    let first = activity_ops::fix_recurring_activities(&conn).unwrap();
    assert_eq!(first.heads_checked, 2);
    assert_eq!(first.heads_repaired, 1);
    assert_eq!(first.instances_created, 3);

    let series = activity_queries::series(&conn, legacy.id).unwrap();
    assert_eq!(series.dates(), vec![d(1, 1), d(1, 8), d(1, 15), d(1, 22)]);

    let second = activity_ops::fix_recurring_activities(&conn).unwrap();
    assert_eq!(second.heads_repaired, 0);
    assert_eq!(second.instances_created, 0);
    assert_eq!(reload(&conn).len(), 8);
}

#[test]
fn deleting_future_from_first_instance_is_not_undone_by_repair() {
    let (conn, user) = setup();
    let (head_id, all) = weekly_series(&conn, &user);

    activity_ops::delete_activity(&conn, Some(&user), on(&all, d(1, 8)).id, true).unwrap();

    let head = activity_queries::find_activity(&conn, head_id).unwrap().unwrap();
    assert_eq!(head.recurrence().map(|r| r.until), Some(d(1, 1)));

    let summary = activity_ops::fix_recurring_activities(&conn).unwrap();
    assert_eq!(summary.instances_created, 0);
    let series = activity_queries::series(&conn, head_id).unwrap();
    assert_eq!(series.dates(), vec![d(1, 1)]);
}

#[test]
fn deleting_future_moves_series_end_to_last_remaining_occurrence() {
    let (conn, user) = setup();
    let (head_id, all) = weekly_series(&conn, &user);

    activity_ops::delete_activity(&conn, Some(&user), on(&all, d(1, 15)).id, true).unwrap();

    let head = activity_queries::find_activity(&conn, head_id).unwrap().unwrap();
    assert_eq!(head.recurrence().map(|r| r.until), Some(d(1, 8)));
    activity_ops::fix_recurring_activities(&conn).unwrap();
    let series = activity_queries::series(&conn, head_id).unwrap();
    assert_eq!(series.dates(), vec![d(1, 1), d(1, 8)]);
}

#[test]
fn deleting_single_occurrence_keeps_series_end() {
    let (conn, user) = setup();
    let (head_id, all) = weekly_series(&conn, &user);

    activity_ops::delete_activity(&conn, Some(&user), on(&all, d(1, 22)).id, false).unwrap();

    let head = activity_queries::find_activity(&conn, head_id).unwrap().unwrap();
    assert_eq!(head.recurrence().map(|r| r.until), Some(d(1, 22)));
}

#[test]
fn promoted_head_anchors_later_extensions() {
    let (conn, user) = setup();
    let head_id = activity_ops::create_activity(
        &conn,
        Some(&user),
        NewActivity::recurring("Board meeting", d(1, 31), RecurrenceRule::Monthly, d(3, 31)),
    )
    .unwrap();

    activity_ops::delete_activity(&conn, Some(&user), head_id, false).unwrap();
    let new_head = reload(&conn).into_iter().find(|a| a.is_head()).unwrap();
    assert_eq!(new_head.date, d(2, 29));
    assert_eq!(new_head.recurrence().map(|r| r.until), Some(d(3, 31)));

    activity_ops::change_recurrence_end(&conn, Some(&user), new_head.id, d(5, 31)).unwrap();

    let series = activity_queries::series(&conn, new_head.id).unwrap();
    assert_eq!(series.dates(), vec![d(2, 29), d(3, 31), d(4, 29), d(5, 29)]);
}

// ==========================================================================
// ATTENDANCE LEDGER
// ==========================================================================

#[test]
fn marking_twice_updates_in_place() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let activity = activity_ops::create_activity(&conn, Some(&user), NewActivity::single("Open day", d(3, 2))).unwrap();

    let first = attendance_ops::mark(&conn, Some(&user), activity, eva.id, AttendanceStatus::Present, None).unwrap();
    let second = attendance_ops::mark(&conn, Some(&user), activity, eva.id, AttendanceStatus::Absent, Some("sick")).unwrap();

    assert_eq!(first, second);
    let records = attendance_queries::attendance_for_activity(&conn, activity).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AttendanceStatus::Absent);
    assert_eq!(records[0].note, Some("sick".into()));
}

#[test]
fn bulk_mark_after_mark_keeps_one_record() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let activity = activity_ops::create_activity(&conn, Some(&user), NewActivity::single("Open day", d(3, 2))).unwrap();

    attendance_ops::mark(&conn, Some(&user), activity, eva.id, AttendanceStatus::Present, None).unwrap();
    attendance_ops::bulk_mark(
        &conn,
        Some(&user),
        activity,
        &[AttendanceMark::new(eva.id, AttendanceStatus::Absent)],
    )
    .unwrap();

    let records = attendance_queries::attendance_for_activity(&conn, activity).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AttendanceStatus::Absent);
}

#[test]
fn bulk_mark_is_all_or_nothing() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let activity = activity_ops::create_activity(&conn, Some(&user), NewActivity::single("Open day", d(3, 2))).unwrap();

    let result = attendance_ops::bulk_mark(
        &conn,
        Some(&user),
        activity,
        &[
            AttendanceMark::new(eva.id, AttendanceStatus::Present),
            AttendanceMark::new(Id::generate(), AttendanceStatus::Present),
        ],
    );

    assert!(matches!(result, Err(RosterError::NotFound { .. })));
    assert!(attendance_queries::attendance_for_activity(&conn, activity).unwrap().is_empty());
}

#[test]
fn mark_records_who_marked() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let activity = activity_ops::create_activity(&conn, Some(&user), NewActivity::single("Open day", d(3, 2))).unwrap();

    attendance_ops::mark(&conn, Some(&user), activity, eva.id, AttendanceStatus::Present, Some("  ")).unwrap();

    let record = attendance_queries::find_attendance(&conn, activity, eva.id).unwrap().unwrap();
    assert_eq!(record.marked_by, user.id);
    assert_eq!(record.note, None);
}

#[test]
fn mark_unknown_activity_is_not_found() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let result = attendance_ops::mark(&conn, Some(&user), Id::generate(), eva.id, AttendanceStatus::Present, None);
    assert!(matches!(result, Err(RosterError::NotFound { .. })));
}

#[test]
fn mark_requires_caller() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let activity = activity_ops::create_activity(&conn, Some(&user), NewActivity::single("Open day", d(3, 2))).unwrap();
    let result = attendance_ops::mark(&conn, None, activity, eva.id, AttendanceStatus::Present, None);
    assert!(matches!(result, Err(RosterError::Unauthenticated)));
}

#[test]
fn unmark_removes_record() {
    let (conn, user) = setup();
    let eva = add_member(&conn, &user, "Eva");
    let activity = activity_ops::create_activity(&conn, Some(&user), NewActivity::single("Open day", d(3, 2))).unwrap();
    attendance_ops::mark(&conn, Some(&user), activity, eva.id, AttendanceStatus::Present, None).unwrap();

    assert!(attendance_ops::unmark(&conn, Some(&user), activity, eva.id).unwrap());
    assert!(!attendance_ops::unmark(&conn, Some(&user), activity, eva.id).unwrap());
    assert!(attendance_queries::find_attendance(&conn, activity, eva.id).unwrap().is_none());
}
