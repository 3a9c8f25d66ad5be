#![allow(dead_code)]

use central_core::db::open_db_in_memory;
use central_core::repo::{ActorRepository, FormRepository, ProjectRepository};
use central_core::{
    AccessService, Actor, AssignmentScope, FormState, NewForm, ProjectId, Role, SqliteStore,
};
use rusqlite::Connection;

pub const DEFAULT_PROJECT: ProjectId = 1;
pub const ALICE: &str = "alice@getodk.org";
pub const CHELSEA: &str = "chelsea@getodk.org";

/// Default project with `simple` and `withrepeat` published, and
/// `withAttachments` as a draft with attachments.
pub fn seeded() -> Connection {
    seed(false)
}

/// Same as [`seeded`] but `withAttachments` is published and closed.
pub fn seeded_with_closed_form() -> Connection {
    seed(true)
}

fn seed(closed_attachments_form: bool) -> Connection {
    let conn = open_db_in_memory().unwrap();
    {
        let store = SqliteStore::new(&conn);
        let alice = store.create_actor(ALICE, "Alice").unwrap();
        store
            .assign_role(alice.id, Role::Admin, AssignmentScope::Site)
            .unwrap();
        store.create_actor(CHELSEA, "Chelsea").unwrap();

        let project = store.create_project("Default Project").unwrap();
        assert_eq!(project.id, DEFAULT_PROJECT);
        store
            .create_form(project.id, &NewForm::published("simple").with_name("Simple"))
            .unwrap();
        store
            .create_form(project.id, &NewForm::published("withrepeat"))
            .unwrap();

        if closed_attachments_form {
            let form = store
                .create_form(
                    project.id,
                    &NewForm::published("withAttachments").with_attachments(),
                )
                .unwrap();
            store
                .update_form(form.id, None, Some(FormState::Closed))
                .unwrap();
        } else {
            store
                .create_form(
                    project.id,
                    &NewForm::draft("withAttachments").with_attachments(),
                )
                .unwrap();
        }
    }
    conn
}

/// Gives `email` the data collector role on the default project and
/// resolves the actor afresh.
pub fn as_collector(service: &AccessService<SqliteStore<'_>>, email: &str) -> Actor {
    let actor = service.resolve_actor_by_email(email).unwrap();
    service
        .store()
        .assign_role(
            actor.id,
            Role::DataCollector,
            AssignmentScope::Project(DEFAULT_PROJECT),
        )
        .unwrap();
    service.resolve_actor_by_email(email).unwrap()
}

pub fn as_alice(service: &AccessService<SqliteStore<'_>>) -> Actor {
    service.resolve_actor_by_email(ALICE).unwrap()
}
