// Category 4: Database Storage Tests (db_storage.rs, schema.rs)
// Tests for constraints, rollback, cascades and relationship queries

use tempfile::TempDir;

use crate::config::DbConfig;
use crate::db_storage::DbStorage;
use crate::error::AppError;
use crate::models::{Amenity, City, Entity, Kind, Model, Place, Review, State, User};
use crate::storage::StorageEngine;

fn create_test_storage() -> DbStorage {
    DbStorage::in_memory().expect("Failed to open in-memory database")
}

fn commit(storage: &DbStorage, models: Vec<Model>) {
    for model in models {
        storage.register(model).unwrap();
    }
    storage.persist().expect("commit should succeed");
}

fn assert_constraint(storage: &DbStorage, model: Model) {
    storage.register(model).unwrap();
    match storage.persist() {
        Err(AppError::Constraint(_)) => {}
        other => panic!("Expected AppError::Constraint, got {:?}", other),
    }
    storage.rollback().unwrap();
}

/// Test Case 4.1: Commit A State And Its City
#[test]
fn test_commit_state_and_city() {
    let storage = create_test_storage();
    let state = State::new("California");
    let city = City::new("San Jose", state.id());

    commit(&storage, vec![state.clone().into(), city.clone().into()]);

    assert_eq!(storage.count(None).unwrap(), 2);
    let cities = state.cities(&storage).unwrap();
    assert_eq!(cities, vec![city.clone()]);
    assert_eq!(cities[0].name.as_deref(), Some("San Jose"));
    assert_eq!(cities[0].state_id.as_deref(), Some(state.id()));
}

/// Test Case 4.2: City Without state_id, Then Rollback
#[test]
fn test_city_requires_state_id() {
    let storage = create_test_storage();
    let state = State::new("California");
    commit(&storage, vec![state.clone().into()]);

    let orphan = City {
        name: Some("San Francisco".into()),
        ..City::default()
    };
    storage.register(orphan.into()).unwrap();
    assert!(matches!(storage.persist(), Err(AppError::Constraint(_))));

    // the session refuses work until rolled back
    assert!(matches!(
        storage.register(City::new("San Jose", state.id()).into()),
        Err(AppError::RollbackRequired)
    ));
    assert!(matches!(storage.query(None), Err(AppError::RollbackRequired)));

    storage.rollback().unwrap();
    let city = City::new("San Jose", state.id());
    commit(&storage, vec![city.clone().into()]);
    assert_eq!(state.cities(&storage).unwrap(), vec![city]);
}

/// Test Case 4.3: City Without name
#[test]
fn test_city_requires_name() {
    let storage = create_test_storage();
    let state = State::new("California");
    commit(&storage, vec![state.clone().into()]);

    let unnamed = City {
        state_id: Some(state.id().to_string()),
        ..City::default()
    };
    assert_constraint(&storage, unnamed.into());
    assert_eq!(storage.count(Some(Kind::City)).unwrap(), 0);
}

/// Test Case 4.4: Place Required Fields
#[test]
fn test_place_required_fields() {
    let storage = create_test_storage();
    let state = State::new("California");
    let city = City::new("San Francisco", state.id());
    let user = User::new("poppy@holberton.com", "betty98");
    commit(&storage, vec![state.into(), city.clone().into(), user.clone().into()]);

    let without_city = Place {
        user_id: Some(user.id().to_string()),
        name: Some("Betty".into()),
        ..Place::default()
    };
    let without_user = Place {
        city_id: Some(city.id().to_string()),
        name: Some("Betty".into()),
        ..Place::default()
    };
    let without_name = Place {
        city_id: Some(city.id().to_string()),
        user_id: Some(user.id().to_string()),
        ..Place::default()
    };
    for place in [without_city, without_user, without_name] {
        assert_constraint(&storage, place.into());
    }

    commit(&storage, vec![Place::new(city.id(), user.id(), "Betty").into()]);
    assert_eq!(storage.count(Some(Kind::Place)).unwrap(), 1);
}

/// Test Case 4.5: Review And User Required Fields
#[test]
fn test_review_and_user_required_fields() {
    let storage = create_test_storage();
    let state = State::new("California");
    let city = City::new("San Francisco", state.id());
    let user = User::new("poppy@holberton.com", "betty98");
    let place = Place::new(city.id(), user.id(), "Betty");
    commit(
        &storage,
        vec![state.into(), city.into(), user.clone().into(), place.clone().into()],
    );

    let without_text = Review {
        place_id: Some(place.id().to_string()),
        user_id: Some(user.id().to_string()),
        ..Review::default()
    };
    let without_place = Review {
        text: Some("stellar".into()),
        user_id: Some(user.id().to_string()),
        ..Review::default()
    };
    let without_author = Review {
        text: Some("stellar".into()),
        place_id: Some(place.id().to_string()),
        ..Review::default()
    };
    for review in [without_text, without_place, without_author] {
        assert_constraint(&storage, review.into());
    }

    let no_email = User {
        password: Some("pwd".into()),
        ..User::default()
    };
    let no_password = User {
        email: Some("a@b.c".into()),
        ..User::default()
    };
    assert_constraint(&storage, no_email.into());
    assert_constraint(&storage, no_password.into());
    assert_constraint(&storage, State::default().into());
    assert_constraint(&storage, Amenity::default().into());
}

/// Test Case 4.6: Dangling Foreign Key
#[test]
fn test_city_with_unknown_state() {
    let storage = create_test_storage();
    assert_constraint(&storage, City::new("Nowhere", "no-such-state").into());
}

/// Test Case 4.7: Deleting A State Cascades To Its Cities
#[test]
fn test_state_delete_cascades() {
    let storage = create_test_storage();
    let state = State::new("California");
    let city = City::new("San Jose", state.id());
    commit(&storage, vec![state.clone().into(), city.clone().into()]);

    storage.delete(Some(&state.into())).unwrap();
    storage.persist().unwrap();

    assert_eq!(storage.get(Kind::City, city.id()).unwrap(), None);
    assert_eq!(storage.count(None).unwrap(), 0);
}

/// Test Case 4.8: Cascades Run Down The Ownership Tree
#[test]
fn test_deep_cascade() {
    let storage = create_test_storage();
    let state = State::new("California");
    let city = City::new("San Francisco", state.id());
    let user = User::new("poppy@holberton.com", "betty98");
    let place = Place::new(city.id(), user.id(), "Betty");
    let review = Review::new("stellar", place.id(), user.id());
    commit(
        &storage,
        vec![
            state.clone().into(),
            city.into(),
            user.clone().into(),
            place.into(),
            review.into(),
        ],
    );

    state.delete(&storage).unwrap();
    storage.persist().unwrap();

    assert_eq!(storage.count(Some(Kind::Place)).unwrap(), 0);
    assert_eq!(storage.count(Some(Kind::Review)).unwrap(), 0);
    // users are not owned by states
    assert!(storage.get(Kind::User, user.id()).unwrap().is_some());
}

/// Test Case 4.9: Saving Again Updates In Place
/// Re-saving a parent must not drop its children
#[test]
fn test_update_keeps_children() {
    let storage = create_test_storage();
    let mut state = State::new("California");
    let city = City::new("San Jose", state.id());
    commit(&storage, vec![state.clone().into(), city.clone().into()]);

    state.name = Some("Golden State".into());
    state.save(&storage).unwrap();

    let stored = storage
        .get(Kind::State, state.id())
        .unwrap()
        .and_then(State::from_model)
        .expect("state stored");
    assert_eq!(stored.name.as_deref(), Some("Golden State"));
    assert_eq!(stored.base.updated_at, state.base.updated_at);
    assert_eq!(state.cities(&storage).unwrap(), vec![city]);
}

/// Test Case 4.10: Place Amenities Through The Join Table
#[test]
fn test_place_amenities_join() {
    let storage = create_test_storage();
    let state = State::new("California");
    let city = City::new("San Francisco", state.id());
    let user = User::new("poppy@holberton.com", "betty98");
    let water = Amenity::new("water");
    let wifi = Amenity::new("wifi");
    let mut place = Place::new(city.id(), user.id(), "Betty");
    place.add_amenity(&water);
    commit(
        &storage,
        vec![
            state.into(),
            city.into(),
            user.into(),
            water.clone().into(),
            wifi.clone().into(),
            place.clone().into(),
        ],
    );

    assert_eq!(place.amenities(&storage).unwrap(), vec![water.clone()]);

    let stored = storage
        .get(Kind::Place, place.id())
        .unwrap()
        .and_then(Place::from_model)
        .expect("place stored");
    assert_eq!(stored.amenity_ids, vec![water.id().to_string()]);

    // deleting the amenity removes the link, not the place
    water.delete(&storage).unwrap();
    storage.persist().unwrap();
    assert!(place.amenities(&storage).unwrap().is_empty());
    assert!(storage.get(Kind::Place, place.id()).unwrap().is_some());
    assert!(storage.get(Kind::Amenity, wifi.id()).unwrap().is_some());
}

/// Test Case 4.11: Linking An Unknown Amenity Fails
#[test]
fn test_unknown_amenity_link() {
    let storage = create_test_storage();
    let state = State::new("California");
    let city = City::new("San Francisco", state.id());
    let user = User::new("poppy@holberton.com", "betty98");
    commit(&storage, vec![state.into(), city.clone().into(), user.clone().into()]);

    let mut place = Place::new(city.id(), user.id(), "Betty");
    place.add_amenity(&Amenity::new("never saved"));
    assert_constraint(&storage, place.into());
    assert_eq!(storage.count(Some(Kind::Place)).unwrap(), 0);
}

/// Test Case 4.12: Delete Of Nothing Or Of A Missing Row
#[test]
fn test_delete_noops() {
    let storage = create_test_storage();
    storage.delete(None).unwrap();
    assert_eq!(storage.pending_count().unwrap(), 0);

    storage.delete(Some(&State::new("ghost").into())).unwrap();
    storage.persist().unwrap();
    assert_eq!(storage.count(None).unwrap(), 0);
}

/// Test Case 4.13: A Failed Commit Changes Nothing
#[test]
fn test_failed_commit_is_atomic() {
    let storage = create_test_storage();
    let state = State::new("California");
    storage.register(state.into()).unwrap();
    storage.register(City::default().into()).unwrap();

    assert!(matches!(storage.persist(), Err(AppError::Constraint(_))));
    storage.rollback().unwrap();

    assert_eq!(storage.count(None).unwrap(), 0);
    assert_eq!(storage.pending_count().unwrap(), 0);
}

/// Test Case 4.14: Reload And Close Reset A Failed Session
#[test]
fn test_reload_and_close_reset_session() {
    let storage = create_test_storage();
    storage.register(City::default().into()).unwrap();
    assert!(storage.persist().is_err());

    storage.reload().unwrap();
    assert_eq!(storage.count(None).unwrap(), 0);

    storage.register(City::default().into()).unwrap();
    assert!(storage.persist().is_err());
    storage.close().unwrap();
    assert_eq!(storage.count(None).unwrap(), 0);
}

/// Test Case 4.15: Pending Work Is Invisible Until Persist
#[test]
fn test_pending_until_persist() {
    let storage = create_test_storage();
    storage.register(State::new("California").into()).unwrap();

    assert_eq!(storage.pending_count().unwrap(), 1);
    assert_eq!(storage.count(None).unwrap(), 0);

    storage.persist().unwrap();
    assert_eq!(storage.pending_count().unwrap(), 0);
    assert_eq!(storage.count(None).unwrap(), 1);
}

/// Test Case 4.16: Database File Survives Reopen, Test Env Drops It
#[test]
fn test_database_file_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = DbConfig {
        host: "localhost".into(),
        user: Some("hbnb_test".into()),
        password: Some("hbnb_test_pwd".into()),
        name: temp_dir.path().join("hbnb.db").to_string_lossy().into_owned(),
    };
    let state = State::new("California");

    {
        let storage = DbStorage::open(&config, false).unwrap();
        commit(&storage, vec![state.clone().into()]);
    }

    let reopened = DbStorage::open(&config, false).unwrap();
    assert!(reopened.get(Kind::State, state.id()).unwrap().is_some());
    drop(reopened);

    let dropped = DbStorage::open(&config, true).unwrap();
    assert_eq!(dropped.count(None).unwrap(), 0);
}

/// Test Case 4.17: Timestamps Survive The Database Exactly
#[test]
fn test_timestamps_round_trip() {
    let storage = create_test_storage();
    let user = User::new("poppy@holberton.com", "betty98");
    commit(&storage, vec![user.clone().into()]);

    let stored = storage
        .get(Kind::User, user.id())
        .unwrap()
        .expect("user stored");
    assert_eq!(stored.base().created_at, user.base.created_at);
    assert_eq!(stored.base().updated_at, user.base.updated_at);
    assert_eq!(stored.attribute("first_name"), Some(serde_json::Value::Null));
}

/// Test Case 4.18: Unknown Foreign Key Column
#[test]
fn test_children_unknown_column() {
    let storage = create_test_storage();
    let children = storage.children(Kind::City, "name; DROP TABLE states", "x").unwrap();
    assert!(children.is_empty());
}
