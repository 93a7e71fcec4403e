use storefield::prelude::*;
use tempfile::TempDir;
use std::sync::Arc;

fn user_type() -> Arc<RecordType> {
    let mut user = RecordType::new("User");
    user.column("email").unwrap();
    user.store("storage").unwrap();
    user.store_field("preference", FieldOptions::new().sub_keys(["theme"]))
        .unwrap();
    user.store_field("notified", FieldOptions::set()).unwrap();
    user.finish()
}

fn welcome_only() -> ValueSet {
    [Value::symbol("welcome")].into_iter().collect()
}

#[test]
fn saves_in_line() -> anyhow::Result<()> {
    let ty = user_type();
    let mut table = RecordTable::in_memory();
    let mut user = Record::new(&ty);

    assert!(user.add("notified", Value::symbol("welcome"))?.save(&mut table)?);
    user.reload(&table)?;
    assert!(user.contains("notified", &Value::symbol("welcome"))?);
    Ok(())
}

#[test]
fn end_to_end_notifications() -> anyhow::Result<()> {
    let ty = user_type();
    let mut table = RecordTable::in_memory();
    let mut user = Record::new(&ty);

    user.add("notified", Value::symbol("welcome"))?
        .add("notified", Value::symbol("balance_low"))?
        .remove("notified", Value::symbol("balance_low"))?;
    assert_eq!(*user.set_field("notified")?, welcome_only());

    user.save_strict(&mut table)?;
    let mut reloaded = table.find(&ty, user.id())?;
    assert_eq!(*reloaded.set_field("notified")?, welcome_only());
    Ok(())
}

#[test]
fn unsaved_changes_are_dropped_on_reload() -> anyhow::Result<()> {
    let ty = user_type();
    let mut table = RecordTable::in_memory();
    let mut user = Record::new(&ty);
    user.write_attribute("email", "a@example.com")?;
    user.write_attribute("preference_theme", Value::symbol("dark"))?;
    user.save_strict(&mut table)?;

    user.write_attribute("email", "b@example.com")?;
    user.add("notified", Value::symbol("welcome"))?;
    user.reload(&table)?;

    assert_eq!(user.read_attribute("email")?, Value::text("a@example.com"));
    assert_eq!(user.read_attribute("preference_theme")?, Value::symbol("dark"));
    assert!(user.not_contains("notified", &Value::symbol("welcome"))?);
    Ok(())
}

#[test]
fn snapshot_survives_reopen_with_either_codec() -> anyhow::Result<()> {
    for codec in [StoreCodec::Json, StoreCodec::MessagePack] {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("users.snapshot");
        let ty = user_type();

        let id = {
            let config = StorageConfig::new()
                .codec(codec)
                .snapshot_path(&path)
                .checkpoint_on_save(true);
            let mut table = RecordTable::open(config)?;
            let mut user = Record::new(&ty);
            user.add("notified", Value::symbol("welcome"))?;
            user.save_strict(&mut table)?;
            user.id().to_string()
        };

        let reopened = RecordTable::open(StorageConfig::new().codec(codec).snapshot_path(&path))?;
        assert_eq!(reopened.len(), 1);
        let mut user = reopened.find(&ty, &id)?;
        assert!(user.is_persisted());
        assert_eq!(*user.set_field("notified")?, welcome_only());
    }
    Ok(())
}

#[test]
fn reopening_with_another_codec_reencodes_stores() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("users.snapshot");
    let ty = user_type();

    let mut table = RecordTable::new(
        StorageConfig::new()
            .codec(StoreCodec::MessagePack)
            .snapshot_path(&path),
    );
    let mut user = Record::new(&ty);
    user.add("notified", Value::symbol("welcome"))?;
    user.save_strict(&mut table)?;
    table.checkpoint()?;

    let reopened = RecordTable::open(StorageConfig::new().snapshot_path(&path))?;
    let blob = &reopened.row(user.id()).expect("row recovered").stores["storage"];
    assert!(serde_json::from_slice::<serde_json::Value>(blob).is_ok());

    let mut found = reopened.find(&ty, user.id())?;
    assert_eq!(*found.set_field("notified")?, welcome_only());
    Ok(())
}

#[test]
fn definitions_drive_the_same_declarations() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("user.json");
    std::fs::write(
        &path,
        r#"{
            "name": "User",
            "stores": ["storage"],
            "fields": [
                { "name": "notified", "value_kind": "set-of-values", "allowed_values": ["welcome"] }
            ]
        }"#,
    )?;

    let ty = TypeDefinition::from_path(&path)?.build()?.finish();
    let mut user = Record::new(&ty);
    user.add("notified", Value::symbol("welcome"))?;
    assert!(user.add("notified", Value::symbol("spam")).is_err());

    let mut table = RecordTable::in_memory();
    assert!(user.save(&mut table)?);
    Ok(())
}
