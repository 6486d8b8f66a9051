use crate::favorites::FavoritesStore;
use crate::models::{Genre, MovieSummary};
use crate::tmdb::{CatalogApi, TmdbClient};
use crate::view::{self, MovieCardView, MovieDetailView, PaginationView};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 3180;
const DEFAULT_FAVORITES_PATH: &str = "favorites.json";

const HOME_TRENDING_LIMIT: usize = 5;
const HOME_SECTION_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub favorites: Arc<FavoritesStore>,
}

pub async fn run_server() -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_env()?);
    let favorites_path =
        env::var("CINESCOPE_FAVORITES").unwrap_or_else(|_| DEFAULT_FAVORITES_PATH.to_string());
    let favorites = Arc::new(FavoritesStore::load(&favorites_path));
    info!(
        "Loaded {} favorites from {}",
        favorites.len(),
        favorites_path
    );

    let state = AppState { catalog, favorites };
    let app = build_router(state);

    let port = env::var("CINESCOPE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/movie/:id", get(movie_detail))
        .route("/search", get(search))
        .route("/genres", get(genres))
        .route("/genres/:id", get(genre_movies))
        .route("/favorites", get(favorites_page))
        .route("/favorites/toggle", post(toggle_favorite))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Collapse a gateway failure to the absent-value sentinel. From here on a
/// failed fetch is indistinguishable from zero results, matching the catalog's
/// empty-state rendering.
fn or_absent<T>(res: Result<T>, what: &str) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Failed to fetch {}: {:#}", what, e);
            None
        }
    }
}

#[derive(Serialize)]
pub struct HomePage {
    pub trending: Vec<MovieCardView>,
    pub popular: Vec<MovieCardView>,
    pub top_rated: Vec<MovieCardView>,
}

async fn home(State(state): State<AppState>) -> Json<HomePage> {
    let (trending, popular, top_rated) = tokio::join!(
        state.catalog.trending(),
        state.catalog.popular(1),
        state.catalog.top_rated(1),
    );

    let mut trending = or_absent(trending, "trending movies").unwrap_or_default();
    trending.truncate(HOME_TRENDING_LIMIT);
    let mut popular = or_absent(popular, "popular movies")
        .map(|p| p.results)
        .unwrap_or_default();
    popular.truncate(HOME_SECTION_LIMIT);
    let mut top_rated = or_absent(top_rated, "top rated movies")
        .map(|p| p.results)
        .unwrap_or_default();
    top_rated.truncate(HOME_SECTION_LIMIT);

    let ids = state.favorites.favorite_ids();
    Json(HomePage {
        trending: view::movie_cards(&trending, &ids),
        popular: view::movie_cards(&popular, &ids),
        top_rated: view::movie_cards(&top_rated, &ids),
    })
}

#[derive(Serialize)]
pub struct MovieDetailPage {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie: Option<MovieDetailView>,
}

async fn movie_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<MovieDetailPage> {
    let detail = or_absent(state.catalog.movie_detail(id).await, "movie detail");
    let ids = state.favorites.favorite_ids();
    Json(match detail {
        Some(d) => MovieDetailPage {
            found: true,
            movie: Some(view::movie_detail(&d, &ids)),
        },
        None => MovieDetailPage {
            found: false,
            movie: None,
        },
    })
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    page: Option<i64>,
}

#[derive(Serialize)]
pub struct SearchPage {
    pub query: String,
    pub results: Vec<MovieCardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationView>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchPage> {
    let query = params.q.trim().to_string();
    // A blank query is a no-op: no gateway call is issued.
    if query.is_empty() {
        return Json(SearchPage {
            query,
            results: Vec::new(),
            pagination: None,
        });
    }

    let page = params.page.unwrap_or(1).max(1);
    let found = or_absent(state.catalog.search(&query, page).await, "search results");
    let ids = state.favorites.favorite_ids();
    Json(match found {
        Some(p) => SearchPage {
            query,
            results: view::movie_cards(&p.results, &ids),
            pagination: Some(view::pagination(&p)),
        },
        None => SearchPage {
            query,
            results: Vec::new(),
            pagination: None,
        },
    })
}

#[derive(Serialize)]
pub struct GenresPage {
    pub genres: Vec<Genre>,
}

async fn genres(State(state): State<AppState>) -> Json<GenresPage> {
    let genres = or_absent(state.catalog.genres().await, "genre catalog").unwrap_or_default();
    Json(GenresPage { genres })
}

#[derive(Deserialize)]
pub struct PageParams {
    page: Option<i64>,
}

#[derive(Serialize)]
pub struct GenreMoviesPage {
    pub genre_id: i64,
    pub genre_name: Option<String>,
    pub results: Vec<MovieCardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationView>,
}

async fn genre_movies(
    State(state): State<AppState>,
    Path(genre_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Json<GenreMoviesPage> {
    let page = params.page.unwrap_or(1).max(1);
    let (genres, movies) = tokio::join!(
        state.catalog.genres(),
        state.catalog.discover_by_genre(genre_id, page),
    );

    let genre_name = or_absent(genres, "genre catalog")
        .unwrap_or_default()
        .into_iter()
        .find(|g| g.id == genre_id)
        .map(|g| g.name);
    let movies = or_absent(movies, "movies by genre");
    let ids = state.favorites.favorite_ids();
    Json(match movies {
        Some(p) => GenreMoviesPage {
            genre_id,
            genre_name,
            results: view::movie_cards(&p.results, &ids),
            pagination: Some(view::pagination(&p)),
        },
        None => GenreMoviesPage {
            genre_id,
            genre_name,
            results: Vec::new(),
            pagination: None,
        },
    })
}

#[derive(Serialize)]
pub struct FavoritesPage {
    pub total: usize,
    pub movies: Vec<MovieCardView>,
}

async fn favorites_page(State(state): State<AppState>) -> Json<FavoritesPage> {
    let movies = state.favorites.all();
    let ids = state.favorites.favorite_ids();
    Json(FavoritesPage {
        total: movies.len(),
        movies: view::movie_cards(&movies, &ids),
    })
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub id: i64,
    pub is_favorite: bool,
    pub total: usize,
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Json(movie): Json<MovieSummary>,
) -> Json<ToggleResponse> {
    let id = movie.id;
    let title = movie.title.clone();
    let is_favorite = state.favorites.toggle(movie);
    info!(
        "{} '{}' ({})",
        if is_favorite { "Favorited" } else { "Unfavorited" },
        title,
        id
    );
    Json(ToggleResponse {
        id,
        is_favorite,
        total: state.favorites.len(),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
