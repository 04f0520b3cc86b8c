//! User endpoints: authentication, profile, and admin user management
//! over `/api/users`.

use futures::FutureExt;
use serde_json::Value;
use vetrina_api_types::{LoginRequest, ProfileUpdateRequest, RegisterRequest, UserUpdateRequest};

use crate::client::{ApiClient, ClientError};
use crate::query::{MutationDescriptor, QueryCoordinator, QuerySnapshot, ReadOptions};

use super::keys;

const USERS_URL: &str = "/api/users";

/// Authenticate. The backend sets its JWT cookie on the shared cookie
/// store; the cached profile is invalidated so the next read refetches
/// the signed-in user.
pub fn login(client: &ApiClient) -> MutationDescriptor<LoginRequest> {
    let api = client.clone();
    MutationDescriptor::new("login", move |credentials: LoginRequest| {
        let api = api.clone();
        async move { api.post(&format!("{USERS_URL}/auth"), &credentials).await }.boxed()
    })
    .invalidates(|_, _| vec![keys::user_profile()])
}

/// Register a new account and sign in.
pub fn register(client: &ApiClient) -> MutationDescriptor<RegisterRequest> {
    let api = client.clone();
    MutationDescriptor::new("register", move |registration: RegisterRequest| {
        let api = api.clone();
        async move { api.post(USERS_URL, &registration).await }.boxed()
    })
    .invalidates(|_, _| vec![keys::user_profile()])
}

/// Sign out, then drop the entire query store so nothing cached leaks
/// into the next session. The store is only cleared when the server
/// accepted the logout.
pub async fn logout(
    client: &ApiClient,
    queries: &QueryCoordinator,
) -> Result<Value, ClientError> {
    let data = client
        .post(&format!("{USERS_URL}/logout"), &serde_json::json!({}))
        .await?;
    queries.clear_all();
    Ok(data)
}

/// Update the signed-in user's own profile.
pub fn update_profile(client: &ApiClient) -> MutationDescriptor<ProfileUpdateRequest> {
    let api = client.clone();
    MutationDescriptor::new("update_profile", move |update: ProfileUpdateRequest| {
        let api = api.clone();
        async move { api.put(&format!("{USERS_URL}/profile"), &update).await }.boxed()
    })
    .invalidates(|_, _| vec![keys::user_profile()])
}

/// Every user (admin).
pub async fn users(client: &ApiClient, queries: &QueryCoordinator) -> QuerySnapshot {
    let api = client.clone();
    queries
        .read(
            keys::users(),
            move || async move { api.get(USERS_URL).await },
            ReadOptions::default(),
        )
        .await
}

/// Fetch one user by id (admin). No fetch is issued while `user_id` is
/// absent.
pub async fn user_details(
    client: &ApiClient,
    queries: &QueryCoordinator,
    user_id: Option<&str>,
) -> QuerySnapshot {
    let id = user_id.unwrap_or_default();
    let api = client.clone();
    let path = format!("{USERS_URL}/{id}");
    queries
        .read(
            keys::user(id),
            move || async move { api.get(&path).await },
            ReadOptions::default().enabled(!id.is_empty()),
        )
        .await
}

/// Delete a user (admin). Takes the user id; invalidates the user list.
pub fn delete_user(client: &ApiClient) -> MutationDescriptor<String> {
    let api = client.clone();
    MutationDescriptor::new("delete_user", move |user_id: String| {
        let api = api.clone();
        async move { api.delete(&format!("{USERS_URL}/{user_id}")).await }.boxed()
    })
    .invalidates(|_, _| vec![keys::users()])
}

/// Input for [`update_user`].
#[derive(Debug, Clone)]
pub struct UpdateUserInput {
    pub user_id: String,
    pub update: UserUpdateRequest,
}

/// Update another user (admin). Invalidates that user and the user list.
pub fn update_user(client: &ApiClient) -> MutationDescriptor<UpdateUserInput> {
    let api = client.clone();
    MutationDescriptor::new("update_user", move |input: UpdateUserInput| {
        let api = api.clone();
        async move {
            api.put(&format!("{USERS_URL}/{}", input.user_id), &input.update)
                .await
        }
        .boxed()
    })
    .invalidates(|_, input| vec![keys::user(&input.user_id), keys::users()])
}
