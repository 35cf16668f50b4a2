use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use super::model::{Activity, MediaListEntry, MediaType, Profile};

const PROFILE_QUERY: &str = r#"
query ($userName: String) {
  User(name: $userName) {
    id
    name
    about
    avatar {
      large
      medium
    }
    bannerImage
    statistics {
      anime {
        count
        episodesWatched
        meanScore
      }
      manga {
        count
        chaptersRead
        meanScore
      }
    }
  }
}
"#;

const ACTIVITIES_QUERY: &str = r#"
query ($userId: Int, $page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    activities(userId: $userId, sort: ID_DESC) {
      ... on ListActivity {
        id
        type
        status
        progress
        createdAt
        media {
          id
          title {
            romaji
          }
          coverImage {
            large
          }
          siteUrl
        }
      }
    }
  }
}
"#;

const MEDIA_LIST_QUERY: &str = r#"
query ($userName: String, $type: MediaType) {
  MediaListCollection(userName: $userName, type: $type) {
    lists {
      entries {
        media {
          id
          title {
            romaji
            english
          }
          coverImage {
            large
          }
          siteUrl
          genres
          episodes
          chapters
        }
        status
        score
        progress
      }
    }
  }
}
"#;

const ACTIVITIES_PER_PAGE: u32 = 10;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("profile response could not be decoded: {0}")]
    Decode(#[from] std::io::Error),
    #[error("{0}")]
    Api(String),
    #[error("no profile named {0}")]
    NotFound(String),
    #[error("{0} response was empty")]
    Empty(&'static str),
    #[error("{0} fetch panicked")]
    Panicked(&'static str),
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserData {
    #[serde(rename = "User")]
    user: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ActivityPage {
    #[serde(rename = "Page")]
    page: Option<ActivityList>,
}

#[derive(Debug, Deserialize)]
struct ActivityList {
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MediaListData {
    #[serde(rename = "MediaListCollection")]
    collection: Option<MediaListCollection>,
}

#[derive(Debug, Deserialize)]
struct MediaListCollection {
    #[serde(default)]
    lists: Vec<MediaListGroup>,
}

#[derive(Debug, Deserialize)]
struct MediaListGroup {
    #[serde(default)]
    entries: Vec<MediaListEntry>,
}

/// POST `query` with `variables` and decode the `data` member.
///
/// AniList reports unknown users with an error status and a JSON body, so
/// status errors are decoded like regular responses.
fn post_query<T: DeserializeOwned>(
    agent: &ureq::Agent,
    endpoint: &str,
    query: &str,
    variables: Value,
) -> Result<GraphQlResponse<T>, ProfileError> {
    let request = agent
        .post(endpoint)
        .set("Accept", "application/json")
        .send_json(json!({
            "query": query,
            "variables": variables,
        }));

    let response = match request {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(e) => {
            return Err(ProfileError::Request {
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            });
        }
    };

    Ok(response.into_json()?)
}

/// The first GraphQL error wins over any partial data.
pub(super) fn data_from_response<T>(body: GraphQlResponse<T>) -> Result<Option<T>, ProfileError> {
    match body.errors.into_iter().next() {
        Some(first) => Err(ProfileError::Api(first.message)),
        None => Ok(body.data),
    }
}

/// Query the GraphQL endpoint for `user_name`.
pub fn fetch_profile(
    agent: &ureq::Agent,
    endpoint: &str,
    user_name: &str,
) -> Result<Profile, ProfileError> {
    let body = post_query(
        agent,
        endpoint,
        PROFILE_QUERY,
        json!({ "userName": user_name }),
    )?;
    profile_from_response(body, user_name)
}

pub(super) fn profile_from_response(
    body: GraphQlResponse<UserData>,
    user_name: &str,
) -> Result<Profile, ProfileError> {
    data_from_response(body)?
        .and_then(|d| d.user)
        .ok_or_else(|| ProfileError::NotFound(user_name.to_string()))
}

/// The most recent list activities of `user_id`.
pub fn fetch_activities(
    agent: &ureq::Agent,
    endpoint: &str,
    user_id: u64,
) -> Result<Vec<Activity>, ProfileError> {
    let body = post_query(
        agent,
        endpoint,
        ACTIVITIES_QUERY,
        json!({ "userId": user_id, "page": 1, "perPage": ACTIVITIES_PER_PAGE }),
    )?;
    activities_from_response(body)
}

pub(super) fn activities_from_response(
    body: GraphQlResponse<ActivityPage>,
) -> Result<Vec<Activity>, ProfileError> {
    let page = data_from_response(body)?
        .and_then(|d| d.page)
        .ok_or(ProfileError::Empty("activity feed"))?;
    Ok(page
        .activities
        .into_iter()
        .filter(|a| a.media.is_some())
        .collect())
}

/// All entries of the user's `kind` list collection, flattened across the
/// status groups.
pub fn fetch_media_list(
    agent: &ureq::Agent,
    endpoint: &str,
    user_name: &str,
    kind: MediaType,
) -> Result<Vec<MediaListEntry>, ProfileError> {
    let body = post_query(
        agent,
        endpoint,
        MEDIA_LIST_QUERY,
        json!({ "userName": user_name, "type": kind.as_str() }),
    )?;
    media_list_from_response(body)
}

pub(super) fn media_list_from_response(
    body: GraphQlResponse<MediaListData>,
) -> Result<Vec<MediaListEntry>, ProfileError> {
    let collection = data_from_response(body)?
        .and_then(|d| d.collection)
        .ok_or(ProfileError::Empty("media list"))?;
    Ok(collection
        .lists
        .into_iter()
        .flat_map(|group| group.entries)
        .collect())
}
