// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn memory_store_clones_share_entries() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let tokens = TokenStore::new(store.clone());
    assert_eq!(tokens.get(), None);

    tokens.set("tok-1")?;
    assert_eq!(store.get(ACCESS_TOKEN_KEY)?.as_deref(), Some("tok-1"));
    assert_eq!(tokens.get().as_deref(), Some("tok-1"));

    tokens.clear()?;
    assert_eq!(tokens.get(), None);
    assert_eq!(store.get(ACCESS_TOKEN_KEY)?, None);
    Ok(())
}

#[test]
fn empty_token_counts_as_absent() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.set(ACCESS_TOKEN_KEY, "")?;
    assert_eq!(TokenStore::new(store).get(), None);
    Ok(())
}

#[test]
fn set_replaces_previous_token() -> anyhow::Result<()> {
    let tokens = TokenStore::new(MemoryStore::new());
    tokens.set("old")?;
    tokens.set("new")?;
    assert_eq!(tokens.get().as_deref(), Some("new"));
    Ok(())
}

#[test]
fn file_store_missing_file_is_empty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path().join("token.json"));
    assert_eq!(store.get(ACCESS_TOKEN_KEY)?, None);
    // Removing from a missing file is a no-op and creates nothing.
    store.remove(ACCESS_TOKEN_KEY)?;
    assert!(!store.path().exists());
    Ok(())
}

#[test]
fn file_store_persists_across_instances() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("token.json");

    TokenStore::new(FileStore::new(&path)).set("persisted")?;
    assert_eq!(TokenStore::new(FileStore::new(&path)).get().as_deref(), Some("persisted"));

    let contents = std::fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&contents)?;
    assert_eq!(parsed["accessToken"], "persisted");
    Ok(())
}

#[test]
fn file_store_keeps_unrelated_keys() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path().join("store.json"));
    store.set("theme", "dark")?;
    store.set(ACCESS_TOKEN_KEY, "tok")?;
    store.remove(ACCESS_TOKEN_KEY)?;
    assert_eq!(store.get("theme")?.as_deref(), Some("dark"));
    assert_eq!(store.get(ACCESS_TOKEN_KEY)?, None);
    Ok(())
}

#[test]
fn corrupt_file_reads_as_signed_out() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("token.json");
    std::fs::write(&path, "not json")?;
    assert_eq!(TokenStore::new(FileStore::new(&path)).get(), None);
    Ok(())
}

#[test]
fn temp_names_are_unique_per_save() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::new(dir.path().join("token.json"));
    assert_ne!(store.tmp_path(), store.tmp_path());
    Ok(())
}

#[test]
fn concurrent_saves_leave_a_valid_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("token.json");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = FileStore::new(&path);
            std::thread::spawn(move || {
                // Writers pad differently so a shared temp file would corrupt.
                store.set(ACCESS_TOKEN_KEY, &"x".repeat(1 + i * 64))
            })
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| anyhow::anyhow!("writer thread panicked"))??;
    }

    let token = TokenStore::new(FileStore::new(&path)).get().unwrap_or_default();
    assert!(!token.is_empty() && token.chars().all(|c| c == 'x'), "got {token:?}");
    let leftovers = std::fs::read_dir(dir.path())?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
    Ok(())
}
