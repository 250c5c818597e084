use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use prismix::{
    LoadError, MixError, MixJob, Mixer, PrismixConfig, PslParser, SchemaLoader, mix_schemas,
};
use prismix_core::{GENERATED_MARKER, render_schema};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn parser() -> PslParser {
    PslParser::with_env(HashMap::from([(
        "DATABASE_URL".to_string(),
        "postgres://localhost/app".to_string(),
    )]))
}

fn mixer(dir: &Path) -> Mixer<PslParser> {
    Mixer::new(parser()).with_base_dir(dir)
}

fn job(input: &[&str], output: &str) -> MixJob {
    MixJob {
        input: input.iter().map(|s| s.to_string()).collect(),
        output: PathBuf::from(output),
    }
}

fn read(dir: &Path, relative: &str) -> String {
    fs::read_to_string(dir.join(relative)).unwrap()
}

// ---------------------------------------------------------------------------
// Merging fragments
// ---------------------------------------------------------------------------

#[test]
fn test_extension_adds_mapped_field() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "schemas/a.prisma", "model User {\n  id Int @id\n}\n");
    write(
        dir.path(),
        "schemas/b.prisma",
        "model User {\n  id Int @id\n  name String @map(\"user_name\")\n}\n",
    );

    let outcome = mixer(dir.path())
        .run_job(&job(&["schemas/*.prisma"], "out/schema.prisma"))
        .unwrap();
    assert_eq!(outcome.fragments, 2);
    assert_eq!(outcome.models, 1);
    assert!(outcome.skipped.is_empty());

    assert_eq!(
        read(dir.path(), "out/schema.prisma"),
        format!("{GENERATED_MARKER}\n\nmodel User {{\n\tid Int @id\n\tname String @map(\"user_name\")\n}}\n")
    );
}

#[test]
fn test_fragment_with_dangling_relation_is_skipped() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a_post.prisma",
        "model Post {\n  id Int @id\n  authorId Int\n  author User @relation(fields: [authorId], references: [id])\n}\n",
    );
    write(
        dir.path(),
        "b_comment.prisma",
        "model Comment {\n  id Int @id\n  body String\n}\n",
    );

    let outcome = mixer(dir.path())
        .run_job(&job(&["*.prisma"], "schema.prisma"))
        .unwrap();
    assert_eq!(outcome.fragments, 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert!(outcome.skipped[0].path.ends_with("a_post.prisma"));
    assert!(matches!(outcome.skipped[0].error, LoadError::Parse { .. }));

    let text = read(dir.path(), "schema.prisma");
    assert!(text.contains("model Comment {"));
    assert!(!text.contains("model Post"));
}

#[test]
fn test_boolean_default_is_rendered() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "flags.prisma",
        "model Flag {\n  id Int @id\n  active Boolean @default(true)\n  hidden Boolean @default(false)\n}\n",
    );

    mixer(dir.path())
        .run_job(&job(&["flags.prisma"], "schema.prisma"))
        .unwrap();
    let text = read(dir.path(), "schema.prisma");
    assert!(text.contains("\tactive Boolean @default(true)\n"));
    assert!(text.contains("\thidden Boolean @default(false)\n"));
}

#[test]
fn test_later_fragment_replaces_field_in_place() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "01_base.prisma",
        "model User {\n  id Int @id\n  email String @map(\"email_address\")\n  name String\n}\n",
    );
    write(
        dir.path(),
        "02_ext.prisma",
        "model User {\n  id Int @id\n  email String? @unique\n  bio String?\n}\n",
    );

    mixer(dir.path())
        .run_job(&job(&["*.prisma"], "schema.prisma"))
        .unwrap();
    let text = read(dir.path(), "schema.prisma");
    assert!(text.contains(
        "model User {\n\tid Int @id\n\temail String? @unique @map(\"email_address\")\n\tname String\n\tbio String?\n}"
    ));
}

#[test]
fn test_uniques_and_indexes_accumulate() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.prisma",
        "model Tag {\n  id Int @id\n  slug String\n  @@unique([slug])\n  @@index([slug])\n}\n",
    );
    write(
        dir.path(),
        "b.prisma",
        "model Tag {\n  id Int @id\n  label String\n  @@unique([label])\n  @@index([slug])\n}\n",
    );

    mixer(dir.path())
        .run_job(&job(&["a.prisma", "b.prisma"], "schema.prisma"))
        .unwrap();
    let text = read(dir.path(), "schema.prisma");
    assert!(text.contains("\t@@unique([slug])\n\t@@unique([label])\n"));
    assert_eq!(text.matches("@@index([slug])").count(), 2);
}

// ---------------------------------------------------------------------------
// Datasources, generators and enums
// ---------------------------------------------------------------------------

#[test]
fn test_last_fragment_with_concrete_datasource_wins() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "1.prisma", "model A {\n  id Int @id\n}\n");
    write(
        dir.path(),
        "2.prisma",
        "datasource db {\n  provider = \"sqlite\"\n  url = \"file:./second.db\"\n}\n",
    );
    write(
        dir.path(),
        "3.prisma",
        "datasource db {\n  provider = \"postgresql\"\n  url = env(\"DATABASE_URL\")\n}\n",
    );

    mixer(dir.path())
        .run_job(&job(&["*.prisma"], "schema.prisma"))
        .unwrap();
    let text = read(dir.path(), "schema.prisma");
    assert!(text.starts_with(&format!(
        "{GENERATED_MARKER}\n\ndatasource db {{\n\tprovider = \"postgresql\"\n\turl = env(\"DATABASE_URL\")\n}}\n\n"
    )));
    assert!(!text.contains("second.db"));
}

#[test]
fn test_unresolved_datasource_is_not_selected() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "1.prisma",
        "datasource db {\n  provider = \"sqlite\"\n  url = \"file:./dev.db\"\n}\n",
    );
    write(
        dir.path(),
        "2.prisma",
        "datasource db {\n  provider = \"postgresql\"\n  url = env(\"NOT_SET_ANYWHERE\")\n}\n",
    );

    mixer(dir.path())
        .run_job(&job(&["*.prisma"], "schema.prisma"))
        .unwrap();
    let text = read(dir.path(), "schema.prisma");
    assert!(text.contains("url = \"file:./dev.db\""));
    assert!(!text.contains("NOT_SET_ANYWHERE"));
}

#[test]
fn test_generators_and_enums() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "1.prisma",
        "generator client {\n  provider = \"prisma-client-js\"\n}\nenum Role {\n  USER\n  ADMIN\n}\n",
    );
    write(
        dir.path(),
        "2.prisma",
        "generator go {\n  provider = \"prisma-client-go\"\n  binaryTargets = [\"native\"]\n}\nenum Status {\n  ACTIVE @map(\"active\")\n}\n",
    );

    mixer(dir.path())
        .run_job(&job(&["*.prisma"], "schema.prisma"))
        .unwrap();
    let text = read(dir.path(), "schema.prisma");
    assert_eq!(
        text,
        format!(
            "{GENERATED_MARKER}\n\n\
             generator go {{\n\tprovider = \"prisma-client-go\"\n\tbinaryTargets = [\"native\"]\n}}\n\n\
             enum Role {{\n\tUSER\n\tADMIN\n}}\n\n\
             enum Status {{\n\tACTIVE @map(\"active\")\n}}\n"
        )
    );
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_render_failure_writes_nothing_and_later_jobs_run() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "geo.prisma",
        "model Place {\n  id Int @id\n  shape Unsupported(\"polygon\")\n}\n",
    );
    write(dir.path(), "ok.prisma", "model Ok {\n  id Int @id\n}\n");

    let config = PrismixConfig {
        mixers: vec![
            job(&["geo.prisma"], "out/geo.prisma"),
            job(&["ok.prisma"], "out/ok.prisma"),
        ],
    };
    let report = mixer(dir.path()).run(&config);

    assert!(!report.is_success());
    assert_eq!(report.jobs.len(), 2);
    assert!(matches!(report.jobs[0], Err(MixError::Render { .. })));
    assert!(!dir.path().join("out/geo.prisma").exists());
    assert_eq!(report.outcomes().count(), 1);
    assert!(dir.path().join("out/ok.prisma").exists());
}

#[test]
fn test_invalid_glob_pattern() {
    let dir = TempDir::new().unwrap();
    let err = mixer(dir.path())
        .run_job(&job(&["schemas/[.prisma"], "schema.prisma"))
        .unwrap_err();
    assert!(matches!(err, MixError::Glob { ref pattern, .. } if pattern == "schemas/[.prisma"));
}

#[test]
fn test_empty_job_writes_marker_only() {
    let dir = TempDir::new().unwrap();
    let outcome = mixer(dir.path())
        .run_job(&job(&["missing/*.prisma"], "schema.prisma"))
        .unwrap();
    assert_eq!(outcome.fragments, 0);
    assert_eq!(read(dir.path(), "schema.prisma"), format!("{GENERATED_MARKER}\n"));
}

#[test]
fn test_base_dir_with_glob_characters_is_literal() {
    let dir = tempfile::Builder::new()
        .prefix("fragments_[x]_")
        .tempdir()
        .unwrap();
    write(dir.path(), "a.prisma", "model A {\n  id Int @id\n}\n");

    let outcome = mixer(dir.path())
        .run_job(&job(&["*.prisma"], "out/schema.prisma"))
        .unwrap();
    assert_eq!(outcome.fragments, 1);
    assert!(read(dir.path(), "out/schema.prisma").contains("model A {"));
}

#[test]
fn test_absolute_input_pattern_ignores_base_dir() {
    let fragments = TempDir::new().unwrap();
    write(fragments.path(), "a.prisma", "model A {\n  id Int @id\n}\n");
    let out = TempDir::new().unwrap();

    let pattern = fragments.path().join("*.prisma");
    let outcome = mixer(out.path())
        .run_job(&job(&[pattern.to_str().unwrap()], "schema.prisma"))
        .unwrap();
    assert_eq!(outcome.fragments, 1);
}

#[test]
fn test_config_file_drives_run() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base.prisma", "model User {\n  id Int @id\n}\n");
    write(
        dir.path(),
        "prismix.config.json",
        r#"{ "mixers": [{ "input": ["base.prisma"] }] }"#,
    );

    let config = PrismixConfig::load(dir.path().join("prismix.config.json")).unwrap();
    let report = mixer(dir.path()).run(&config);
    assert!(report.is_success());
    assert!(read(dir.path(), "prisma/schema.prisma").contains("model User {"));
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn test_output_reloads_to_same_schema() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "a.prisma",
        r#"datasource db {
  provider = "postgresql"
  url      = env("DATABASE_URL")
}

enum Role {
  USER  @map("user")
  ADMIN
}

model User {
  id        String   @id @default(uuid()) @db.Uuid
  role      Role     @default(USER)
  createdAt DateTime @default(now()) @map("created_at")
  posts     Post[]
}

model Post {
  id       Int    @id @default(autoincrement())
  authorId String @db.Uuid
  author   User   @relation(fields: [authorId], references: [id], onDelete: Cascade, onUpdate: Cascade)

  @@index([authorId])
  @@map("posts")
}
"#,
    );
    write(
        dir.path(),
        "b.prisma",
        r#"model User {
  id    String @id
  email String @unique @db.VarChar(255)
  @@unique([email, id], name: "email_id")
}
"#,
    );

    let loader = SchemaLoader::new(parser());
    let fragments = vec![
        loader.load(dir.path().join("a.prisma")).unwrap(),
        loader.load(dir.path().join("b.prisma")).unwrap(),
    ];
    let mixed = mix_schemas(fragments);
    let text = render_schema(&mixed).unwrap();

    let reloaded = loader.load_source(&text).unwrap();
    assert_eq!(reloaded.models, mixed.models);
    assert_eq!(reloaded.enums, mixed.enums);
    assert_eq!(reloaded.datasources, mixed.datasources);
    assert_eq!(render_schema(&reloaded).unwrap(), text);
}

#[test]
fn test_multi_line_attributes_survive_round_trip() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "post.prisma",
        "model User {\n  id Int @id\n  posts Post[]\n}\n\nmodel Post {\n  id       Int @id\n  authorId Int\n  a        Int\n  b        Int\n  author   User @relation(\n    fields: [authorId],\n    references: [id],\n    onUpdate: Cascade\n  )\n\n  @@index([a,\n    b])\n  @@fulltext([\n    a\n  ])\n}\n",
    );

    let loader = SchemaLoader::new(parser());
    let schema = loader.load(dir.path().join("post.prisma")).unwrap();
    let text = render_schema(&mix_schemas(vec![schema])).unwrap();
    assert!(text.contains("onUpdate: Cascade"));
    assert!(text.contains("\t@@index([a, b])\n"));
    assert!(text.contains("\t@@fulltext([a])\n"));

    let reloaded = loader.load_source(&text).unwrap();
    assert_eq!(render_schema(&reloaded).unwrap(), text);
}

#[test]
fn test_backslash_in_default_survives_round_trip() {
    let loader = SchemaLoader::new(parser());
    let schema = loader
        .load_source("model A {\n  id Int @id\n  path String @default(\"C:\\\\x\")\n}\n")
        .unwrap();
    let text = render_schema(&schema).unwrap();
    assert!(text.contains("@default(\"C:\\\\x\")"));
    assert_eq!(render_schema(&loader.load_source(&text).unwrap()).unwrap(), text);
}
