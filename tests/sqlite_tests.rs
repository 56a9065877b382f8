use serde_json::json;
use sqlx_pagehelper::{
   ALL_ROWS, NavigationView, PageHelper, PageHelperConfig, PageRequest, ResultEnvelope, RowBounds,
   SqliteRunner, Statement,
};
use tempfile::TempDir;

async fn create_test_db() -> (SqliteRunner, TempDir) {
   let temp_dir = TempDir::new().expect("Failed to create temp directory");
   let db_path = temp_dir.path().join("test.db");
   let runner = SqliteRunner::connect(&db_path)
      .await
      .expect("Failed to connect to test database");

   (runner, temp_dir)
}

/// Seed 7 posts across 3 categories with varying scores.
///
/// ```text
/// id | title  | category | score
/// ---|--------|----------|------
///  1 | Post 1 | science  | 95
///  2 | Post 2 | science  | 80
///  3 | Post 3 | tech     | 90
///  4 | Post 4 | tech     | 85
///  5 | Post 5 | tech     | 70
///  6 | Post 6 | art      | 88
///  7 | Post 7 | art      | 60
/// ```
async fn seed_posts_table(db: &SqliteRunner) {
   db.execute(
      "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT NOT NULL, category TEXT NOT NULL, score INTEGER NOT NULL, cover BLOB, rating REAL)",
      vec![],
   )
   .await
   .unwrap();

   let rows = [
      (1, "Post 1", "science", 95),
      (2, "Post 2", "science", 80),
      (3, "Post 3", "tech", 90),
      (4, "Post 4", "tech", 85),
      (5, "Post 5", "tech", 70),
      (6, "Post 6", "art", 88),
      (7, "Post 7", "art", 60),
   ];

   for (id, title, category, score) in rows {
      db.execute(
         "INSERT INTO posts (id, title, category, score) VALUES ($1, $2, $3, $4)",
         vec![json!(id), json!(title), json!(category), json!(score)],
      )
      .await
      .unwrap();
   }
}

async fn posts_helper() -> (PageHelper, TempDir) {
   posts_helper_with(PageHelperConfig::default()).await
}

async fn posts_helper_with(config: PageHelperConfig) -> (PageHelper, TempDir) {
   let (db, dir) = create_test_db().await;
   seed_posts_table(&db).await;
   let helper = db.page_helper().config(config).build().unwrap();
   (helper, dir)
}

/// Extract the `id` column from each row for concise assertions.
fn row_ids(rows: &[sqlx_pagehelper::Row]) -> Vec<i64> {
   rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

fn posts(sql: &str) -> Statement {
   Statement::new(sql, vec![])
}

#[tokio::test]
async fn detects_sqlite_dialect() {
   let (helper, _dir) = posts_helper().await;
   assert_eq!(helper.default_dialect(), Some("sqlite"));
}

#[tokio::test]
async fn first_and_later_pages() {
   let (helper, _dir) = posts_helper().await;

   let page = helper
      .paginate(PageRequest::new(1, 3), posts("SELECT * FROM posts ORDER BY id"))
      .await
      .unwrap();
   assert_eq!(row_ids(&page.rows), vec![1, 2, 3]);
   assert_eq!(page.total, 7);
   assert_eq!(page.pages, 3);

   let page = helper
      .paginate(PageRequest::new(3, 3), posts("SELECT * FROM posts ORDER BY id"))
      .await
      .unwrap();
   assert_eq!(row_ids(&page.rows), vec![7]);
}

#[tokio::test]
async fn bound_parameters_reach_count_and_page() {
   let (helper, _dir) = posts_helper().await;

   let page = helper
      .paginate(
         PageRequest::new(1, 2),
         Statement::new(
            "SELECT id, title FROM posts WHERE category = ? ORDER BY score DESC",
            vec![json!("tech")],
         ),
      )
      .await
      .unwrap();

   assert_eq!(page.total, 3);
   assert_eq!(row_ids(&page.rows), vec![3, 4]);
   let columns: Vec<&str> = page.rows[0].keys().map(String::as_str).collect();
   assert_eq!(columns, vec!["id", "title"]);
   assert_eq!(page.rows[0]["title"], json!("Post 3"));
}

#[tokio::test]
async fn order_by_from_request() {
   let (helper, _dir) = posts_helper().await;

   let page = helper
      .paginate(
         PageRequest::new(1, 3).with_order_by("score ASC").unwrap(),
         posts("SELECT * FROM posts ORDER BY id"),
      )
      .await
      .unwrap();
   assert_eq!(row_ids(&page.rows), vec![7, 5, 2]);
}

#[tokio::test]
async fn grouped_query_counts_groups() {
   let (helper, _dir) = posts_helper().await;

   let page = helper
      .paginate(
         PageRequest::new(1, 2),
         posts("SELECT category, COUNT(*) AS n FROM posts GROUP BY category ORDER BY category"),
      )
      .await
      .unwrap();

   assert_eq!(page.total, 3);
   assert_eq!(page.rows.len(), 2);
   assert_eq!(page.rows[0]["category"], json!("art"));
   assert_eq!(page.rows[0]["n"], json!(2));
}

#[tokio::test]
async fn distinct_query_counts_distinct_rows() {
   let (helper, _dir) = posts_helper().await;
   let total = helper
      .count(posts("SELECT DISTINCT category FROM posts"))
      .await
      .unwrap();
   assert_eq!(total, 3);
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
   let (helper, _dir) = posts_helper().await;
   let page = helper
      .paginate(PageRequest::new(5, 3), posts("SELECT * FROM posts"))
      .await
      .unwrap();
   assert!(page.rows.is_empty());
   assert_eq!(page.total, 7);
}

#[tokio::test]
async fn all_rows_request() {
   let (helper, _dir) = posts_helper().await;
   let page = helper
      .paginate(PageRequest::new(1, ALL_ROWS), posts("SELECT * FROM posts"))
      .await
      .unwrap();
   assert_eq!(page.rows.len(), 7);
   assert_eq!(page.total, 7);
}

#[tokio::test]
async fn async_count_on_sqlite() {
   let (helper, _dir) = posts_helper_with(PageHelperConfig {
      async_count: true,
      ..Default::default()
   })
   .await;

   let page = helper
      .paginate(PageRequest::new(2, 4), posts("SELECT * FROM posts ORDER BY id"))
      .await
      .unwrap();
   assert_eq!(row_ids(&page.rows), vec![5, 6, 7]);
   assert_eq!(page.total, 7);
   assert_eq!(page.pages, 2);
}

#[tokio::test]
async fn row_bounds_on_sqlite() {
   let (helper, _dir) = posts_helper().await;
   let page = helper
      .select_with_bounds(
         RowBounds::new(2, 3).with_count(true),
         posts("SELECT * FROM posts ORDER BY id"),
      )
      .await
      .unwrap();
   assert_eq!(row_ids(&page.rows), vec![3, 4, 5]);
   assert_eq!(page.total, 7);
}

#[tokio::test]
async fn decodes_blobs_reals_and_nulls() {
   let (db, _dir) = create_test_db().await;
   seed_posts_table(&db).await;
   db.execute(
      "UPDATE posts SET cover = X'CAFE', rating = 4.5 WHERE id = 1",
      vec![],
   )
   .await
   .unwrap();
   let helper = db.page_helper().build().unwrap();

   let page = helper
      .paginate(
         PageRequest::new(1, 2),
         posts("SELECT id, cover, rating FROM posts ORDER BY id"),
      )
      .await
      .unwrap();

   assert_eq!(page.rows[0]["cover"], json!("yv4="));
   assert_eq!(page.rows[0]["rating"], json!(4.5));
   assert_eq!(page.rows[1]["cover"], json!(null));
}

#[tokio::test]
async fn execution_errors_pass_through() {
   let (helper, _dir) = posts_helper().await;
   let err = helper
      .paginate(PageRequest::new(1, 3), posts("SELECT * FROM missing_table"))
      .await
      .unwrap_err();

   assert_eq!(err.error_code(), "EXECUTION_ERROR");
   let source = std::error::Error::source(&err).unwrap();
   assert!(source.to_string().contains("missing_table"));
}

#[tokio::test]
async fn attach_and_detach_on_sqlite() {
   let (helper, _dir) = posts_helper().await;

   let token = helper.attach(PageRequest::new(2, 5));
   let outcome = helper
      .execute(Some(&token), posts("SELECT * FROM posts ORDER BY id"))
      .await
      .unwrap();
   assert_eq!(row_ids(outcome.rows()), vec![6, 7]);

   let request = helper.detach(&token).unwrap();
   assert_eq!(request.total(), 7);
   assert_eq!(request.pages(), 2);
}

#[tokio::test]
async fn navigation_and_envelope() {
   let (helper, _dir) = posts_helper().await;
   let page = helper
      .paginate(PageRequest::new(2, 2), posts("SELECT * FROM posts ORDER BY id"))
      .await
      .unwrap();

   let view: NavigationView<_> = helper.navigation(page.clone());
   assert_eq!(view.navigate_page_nums, vec![1, 2, 3, 4]);
   assert_eq!((view.start_row, view.end_row), (3, 4));
   assert_eq!(view.pre_page, Some(1));
   assert_eq!(view.next_page, Some(3));

   let envelope = ResultEnvelope::from(page);
   let json = serde_json::to_value(&envelope).unwrap();
   assert_eq!(json["total"], 7);
   assert_eq!(json["rows"][0]["id"], 3);
}
