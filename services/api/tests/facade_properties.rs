//! Property tests for the listing and registration paths

use std::sync::Arc;

use api::{BackendFacade, InMemoryBackend, PostForm};
use common::{BackendClient, BackendConfig};
use media::FileHandle;
use proptest::prelude::*;
use tokio::runtime::Runtime;

const CREATORS: [&str; 3] = ["u1", "u2", "u3"];

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn setup() -> (Arc<InMemoryBackend>, BackendFacade) {
    let config = BackendConfig {
        endpoint: "https://cloud.appwrite.io/v1".to_string(),
        platform: "com.aora.app".to_string(),
        project_id: "aora".to_string(),
        database_id: "db".to_string(),
        user_collection_id: "users".to_string(),
        video_collection_id: "videos".to_string(),
        storage_id: "files".to_string(),
        request_timeout: 30,
    };
    let backend = InMemoryBackend::new(BackendClient::new(config).unwrap());
    let facade = backend.facade();
    (backend, facade)
}

fn form(index: usize, user_id: &str) -> PostForm {
    PostForm {
        title: format!("Post {}", index),
        prompt: "P".to_string(),
        thumbnail: FileHandle::from_bytes("thumb.png", "image/png", vec![1]),
        video: FileHandle::from_bytes("clip.mp4", "video/mp4", vec![2]),
        user_id: user_id.to_string(),
    }
}

async fn publish(facade: &BackendFacade, creators: &[usize]) {
    facade
        .register_user("owner@x.com", "pw123456", "owner")
        .await
        .unwrap();
    for (index, creator) in creators.iter().enumerate() {
        facade
            .upload_post(form(index, CREATORS[*creator]))
            .await
            .unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_latest_posts_are_bounded_and_newest_first(
        creators in prop::collection::vec(0..CREATORS.len(), 0..8),
        limit in 0u32..10,
    ) {
        runtime().block_on(async {
            let (_backend, facade) = setup();
            publish(&facade, &creators).await;

            let latest = facade.list_latest_posts(limit).await.unwrap();

            prop_assert!(latest.len() <= limit as usize);
            prop_assert_eq!(latest.len(), creators.len().min(limit as usize));
            for pair in latest.windows(2) {
                prop_assert!(pair[0].created_at >= pair[1].created_at);
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_user_posts_only_contain_that_creator(
        creators in prop::collection::vec(0..CREATORS.len(), 0..8),
        wanted in 0..CREATORS.len(),
    ) {
        runtime().block_on(async {
            let (_backend, facade) = setup();
            publish(&facade, &creators).await;

            let user_id = CREATORS[wanted];
            let posts = facade.list_user_posts(user_id).await.unwrap();

            let expected = creators.iter().filter(|c| **c == wanted).count();
            prop_assert_eq!(posts.len(), expected);
            prop_assert!(posts.iter().all(|post| post.creator_id() == Some(user_id)));
            Ok(())
        })?;
    }

    #[test]
    fn prop_registered_user_is_current(
        local in "[a-z][a-z0-9]{0,11}",
        domain in "[a-z]{1,8}",
        password in "[a-zA-Z0-9]{8,24}",
        username in "[a-zA-Z][a-zA-Z0-9_]{0,20}",
    ) {
        runtime().block_on(async {
            let (backend, facade) = setup();
            let email = format!("{}@{}.com", local, domain);

            let user = facade
                .register_user(&email, &password, &username)
                .await
                .unwrap();
            let current = facade.get_current_user().await.unwrap();

            prop_assert_eq!(current.as_ref().map(|u| u.username.as_str()), Some(username.as_str()));
            prop_assert_eq!(current, Some(user));
            prop_assert_eq!(backend.document_count("db", "users").await, 1);
            Ok(())
        })?;
    }
}
