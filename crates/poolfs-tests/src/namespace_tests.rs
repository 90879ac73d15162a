//! Namespace tree: folders, lookup, listing order, move and rename.

#[cfg(test)]
mod tests {
    use poolfs_remote::ListQuery;
    use poolfs_vfs::FsError;

    use crate::harness::TestPool;

    #[tokio::test]
    async fn test_nested_folders() {
        let pool = TestPool::standard();
        let top = pool.fs.create_folder("a", None).await.unwrap();
        let mid = pool.fs.create_folder("b", Some(&top.id)).await.unwrap();
        let leaf = pool.fs.create_folder("c", Some(&mid.id)).await.unwrap();

        assert_eq!(leaf.parent.as_deref(), Some(mid.id.as_str()));
        let found = pool
            .fs
            .find_by_name("c", Some(&mid.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, leaf.id);
    }

    #[tokio::test]
    async fn test_root_sentinel_resolves() {
        let pool = TestPool::standard();
        let root = pool.fs.find_by_id("root").await.unwrap().unwrap();
        assert!(root.is_directory());
        assert_eq!(root.name, "poolfs");
        assert!(root.parent.is_none(), "root has no parent in entry views");
        assert_eq!(root.id, pool.fs.root_id().await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_orders_directories_first() {
        let pool = TestPool::standard();
        pool.put("zz.bin", None, &[0u8; 4]).await;
        pool.fs.create_folder("aa", None).await.unwrap();
        pool.put("mm.bin", None, &[0u8; 4]).await;
        pool.fs.create_folder("yy", None).await.unwrap();

        let page = pool.fs.list(None, None, None).await.unwrap();
        let names: Vec<&str> = page.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["aa", "yy", "mm.bin", "zz.bin"]);
    }

    #[tokio::test]
    async fn test_list_filter_by_name() {
        let pool = TestPool::standard();
        pool.put("keep.bin", None, &[0u8; 4]).await;
        pool.put("skip.bin", None, &[0u8; 4]).await;

        let query = ListQuery::name("keep.bin");
        let page = pool.fs.list(None, Some(&query), None).await.unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].name, "keep.bin");
    }

    #[tokio::test]
    async fn test_list_missing_folder_is_empty() {
        let pool = TestPool::standard();
        let page = pool.fs.list(Some("no-such-id"), None, None).await.unwrap();
        assert!(page.entries.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_move_file_between_folders() {
        let pool = TestPool::standard();
        let src = pool.fs.create_folder("src", None).await.unwrap();
        let dst = pool.fs.create_folder("dst", None).await.unwrap();
        let file = pool.put("doc.txt", Some(&src.id), b"contents").await;

        let moved = pool.fs.move_entry(&file.id, Some(&dst.id)).await.unwrap();
        assert_eq!(moved.parent.as_deref(), Some(dst.id.as_str()));

        assert!(pool
            .fs
            .find_by_name("doc.txt", Some(&src.id))
            .await
            .unwrap()
            .is_none());

        // Bytes survive the move untouched.
        let downloaded = pool.fs.download(&moved.id).await.unwrap();
        assert_eq!(&downloaded.data[..], b"contents");
    }

    #[tokio::test]
    async fn test_move_folder_carries_children() {
        let pool = TestPool::standard();
        let outer = pool.fs.create_folder("outer", None).await.unwrap();
        let inner = pool.fs.create_folder("inner", None).await.unwrap();
        let file = pool.put("f.bin", Some(&inner.id), &[0u8; 8]).await;

        pool.fs.move_entry(&inner.id, Some(&outer.id)).await.unwrap();

        let still_there = pool.fs.find_by_id(&file.id).await.unwrap().unwrap();
        assert_eq!(still_there.parent.as_deref(), Some(inner.id.as_str()));
    }

    #[tokio::test]
    async fn test_move_root_rejected() {
        let pool = TestPool::standard();
        let folder = pool.fs.create_folder("somewhere", None).await.unwrap();
        let root_id = pool.fs.root_id().await.unwrap();

        let err = pool
            .fs
            .move_entry(&root_id, Some(&folder.id))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_move_into_own_subtree_rejected() {
        let pool = TestPool::standard();
        let outer = pool.fs.create_folder("outer", None).await.unwrap();
        let inner = pool.fs.create_folder("inner", Some(&outer.id)).await.unwrap();
        let leaf = pool.fs.create_folder("leaf", Some(&inner.id)).await.unwrap();

        // Into a descendant, or into itself: both would cut the subtree
        // loose as an unreachable cycle.
        for dest in [leaf.id.as_str(), inner.id.as_str(), outer.id.as_str()] {
            let err = pool
                .fs
                .move_entry(&outer.id, Some(dest))
                .await
                .unwrap_err();
            assert!(matches!(err, FsError::Validation { .. }), "dest {}", dest);
        }

        // An unrelated destination still works.
        let root_id = pool.fs.root_id().await.unwrap();
        let moved = pool.fs.move_entry(&leaf.id, None).await.unwrap();
        assert_eq!(moved.parent.as_deref(), Some(root_id.as_str()));
    }

    #[tokio::test]
    async fn test_move_into_file_rejected() {
        let pool = TestPool::standard();
        let file = pool.put("target.bin", None, &[0u8; 8]).await;
        let victim = pool.put("victim.bin", None, &[0u8; 8]).await;

        let err = pool
            .fs
            .move_entry(&victim.id, Some(&file.id))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NotDirectory { .. }));
    }

    #[tokio::test]
    async fn test_rename_preserves_location_and_content() {
        let pool = TestPool::standard();
        let folder = pool.fs.create_folder("docs", None).await.unwrap();
        let file = pool.put("draft.txt", Some(&folder.id), b"v1").await;

        let renamed = pool.fs.rename(&file.id, "final.txt").await.unwrap();
        assert_eq!(renamed.name, "final.txt");
        assert_eq!(renamed.parent.as_deref(), Some(folder.id.as_str()));
        assert_eq!(&pool.fs.download(&renamed.id).await.unwrap().data[..], b"v1");
    }

    #[tokio::test]
    async fn test_root_cannot_be_renamed() {
        let pool = TestPool::standard();
        let root_id = pool.fs.root_id().await.unwrap();

        // Renaming the root would defeat discovery on the next start.
        for id in ["root", root_id.as_str()] {
            let err = pool.fs.rename(id, "other-name").await.unwrap_err();
            assert!(matches!(err, FsError::Validation { .. }), "id {}", id);
        }
        let root = pool.fs.find_by_id(&root_id).await.unwrap().unwrap();
        assert_eq!(root.name, "poolfs");
    }

    #[tokio::test]
    async fn test_rename_missing_entry() {
        let pool = TestPool::standard();
        assert!(matches!(
            pool.fs.rename("ghost", "x").await,
            Err(FsError::NotFound { .. })
        ));
    }
}
