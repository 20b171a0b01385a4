//! SQLite 存储端到端测试

mod common;

#[cfg(test)]
mod sqlite_store_tests {
    use super::common::{SAMPLE_LINE, create_test_log, create_valid_log, log_pattern, mixed_content};
    use accesslog_import::prelude::*;
    use accesslog_import::store::NewImportJob;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn import(store: &mut SqliteStore, pattern: &str, project: &str, dry_run: bool) -> ImportReport {
        Importer::new(store)
            .import(pattern, project, dry_run)
            .unwrap()
            .finish()
    }

    #[test]
    fn test_import_into_sqlite() {
        let dir = TempDir::new().unwrap();
        create_valid_log(&dir, "access.log", 250);
        let mut store = SqliteStore::open_in_memory().unwrap();

        let report = import(&mut store, &log_pattern(&dir), "site", false);
        assert!(report.is_success());
        assert_eq!(report.entries_accepted, 250);

        let projects = store.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "site");
        assert_eq!(store.get_project(projects[0].id).unwrap(), Some(projects[0].clone()));

        let jobs = store.list_import_jobs(Some(projects[0].id)).unwrap();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert!(job.is_processed);
        assert_eq!(job.filename, "access.log");
        assert_eq!(job.entries_total, 250);
        assert_eq!(job.lines_processed, 250);
        assert_eq!(job.file_lines_count, 250);
        assert_eq!(job.from_time, Some(Utc.with_ymd_and_hms(2023, 10, 10, 0, 0, 0).unwrap()));
        assert_eq!(job.to_time, Some(Utc.with_ymd_and_hms(2023, 10, 10, 0, 4, 9).unwrap()));
        assert_eq!(store.count_entries(job.id).unwrap(), 250);
        assert_eq!(store.get_import_job(job.id).unwrap().as_ref(), Some(job));
    }

    #[test]
    fn test_entry_matches_parsed_record() {
        let dir = TempDir::new().unwrap();
        create_test_log(&dir, "one.log", &format!("{SAMPLE_LINE}\n"));
        let mut store = SqliteStore::open_in_memory().unwrap();
        import(&mut store, &log_pattern(&dir), "site", false);

        let activity = store
            .activity_by_ip("127.0.0.1", &EntryFilter::default(), true)
            .unwrap();
        assert_eq!(activity.len(), 1);
        let entry = &activity[0];
        assert_eq!(entry.datetime, Utc.with_ymd_and_hms(2023, 10, 10, 20, 55, 36).unwrap());
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.path, "/index.php");
        assert_eq!(entry.query.as_deref(), Some("a=1"));
        assert_eq!(entry.status, 200);
        let detail = entry.detail.as_ref().unwrap();
        assert_eq!(detail.referer, None);
        assert_eq!(detail.user_agent.as_deref(), Some("Mozilla/5.0"));

        let brief = store
            .activity_by_ip("127.0.0.1", &EntryFilter::default(), false)
            .unwrap();
        assert!(brief[0].detail.is_none());
    }

    #[test]
    fn test_dry_run_leaves_database_empty() {
        let dir = TempDir::new().unwrap();
        create_test_log(&dir, "mixed.log", &mixed_content(10, 5));
        let mut store = SqliteStore::open_in_memory().unwrap();

        let report = import(&mut store, &log_pattern(&dir), "site", true);
        assert!(report.is_success());
        assert_eq!(report.entries_accepted, 10);
        assert_eq!(report.lines_processed, 15);

        assert!(store.list_projects().unwrap().is_empty());
        assert!(store.list_import_jobs(None).unwrap().is_empty());
        let all = store
            .entries_by_time_range(
                Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
                &EntryFilter::default(),
            )
            .unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_activity_filters() {
        let dir = TempDir::new().unwrap();
        create_valid_log(&dir, "a.log", 8);
        create_valid_log(&dir, "b.log", 8);
        let other_dir = TempDir::new().unwrap();
        create_valid_log(&other_dir, "c.log", 8);

        let mut store = SqliteStore::open_in_memory().unwrap();
        import(&mut store, &log_pattern(&dir), "site", false);
        import(&mut store, &log_pattern(&other_dir), "other", false);

        let site = store.find_project("site").unwrap().unwrap();
        let other = store.find_project("other").unwrap().unwrap();
        let site_jobs = store.list_import_jobs(Some(site.id)).unwrap();
        assert_eq!(site_jobs.len(), 2);
        assert_eq!(store.list_import_jobs(None).unwrap().len(), 3);

        // 每个文件中 10.0.0.1 出现 2 次
        let all = store.activity_by_ip("10.0.0.1", &EntryFilter::default(), false).unwrap();
        assert_eq!(all.len(), 6);

        let by_project = store
            .activity_by_ip("10.0.0.1", &EntryFilter::default().project(site.id), false)
            .unwrap();
        assert_eq!(by_project.len(), 4);

        let by_job = store
            .activity_by_ip(
                "10.0.0.1",
                &EntryFilter::default().import_job(site_jobs[0].id),
                false,
            )
            .unwrap();
        assert_eq!(by_job.len(), 2);
        assert!(by_job.iter().all(|e| e.import_job_id == site_jobs[0].id));

        let mismatched = store
            .activity_by_ip(
                "10.0.0.1",
                &EntryFilter::default().project(other.id).import_job(site_jobs[0].id),
                false,
            )
            .unwrap();
        assert!(mismatched.is_empty());

        assert!(store.activity_by_ip("192.0.2.1", &EntryFilter::default(), false).unwrap().is_empty());
    }

    #[test]
    fn test_activity_ordered_by_time() {
        let dir = TempDir::new().unwrap();
        create_valid_log(&dir, "access.log", 40);
        let mut store = SqliteStore::open_in_memory().unwrap();
        import(&mut store, &log_pattern(&dir), "site", false);

        let activity = store.activity_by_ip("10.0.0.2", &EntryFilter::default(), false).unwrap();
        assert_eq!(activity.len(), 10);
        assert!(activity.windows(2).all(|w| w[0].datetime <= w[1].datetime));
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let dir = TempDir::new().unwrap();
        create_valid_log(&dir, "access.log", 250);
        let mut store = SqliteStore::open_in_memory().unwrap();
        import(&mut store, &log_pattern(&dir), "site", false);

        let entries = store
            .entries_by_time_range(
                Utc.with_ymd_and_hms(2023, 10, 10, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 10, 10, 0, 0, 59).unwrap(),
                &EntryFilter::default(),
            )
            .unwrap();
        assert_eq!(entries.len(), 60);
        assert_eq!(entries.first().unwrap().path, "/page0.php");
        assert_eq!(entries.last().unwrap().path, "/page59.php");
    }

    #[test]
    fn test_file_database_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        create_valid_log(&dir, "access.log", 12);
        let db_path = dir.path().join("accesslog.db");

        {
            let mut store = SqliteStore::open(&db_path).unwrap();
            let report = import(&mut store, &log_pattern(&dir), "site", false);
            assert!(report.is_success());
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let jobs = store.list_import_jobs(None).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(store.count_entries(jobs[0].id).unwrap(), 12);
    }

    #[test]
    fn test_get_or_create_project_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let first = store.get_or_create_project("site").unwrap();
        let second = store.get_or_create_project("site").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_projects().unwrap().len(), 1);
        assert_eq!(store.get_project(first.id + 100).unwrap(), None);
    }

    #[test]
    fn test_rolled_back_transaction_leaves_no_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let project = store.get_or_create_project("site").unwrap();
        let job_id = store
            .create_import_job(&NewImportJob {
                project_id: project.id,
                filename: "access.log",
                file_lines_count: 1,
            })
            .unwrap();

        let record = accesslog_import::accesslog::parse_line(SAMPLE_LINE).unwrap();
        {
            let mut tx = store.begin().unwrap();
            tx.insert_entries(job_id, std::slice::from_ref(&record)).unwrap();
            // 未提交即丢弃
        }
        assert_eq!(store.count_entries(job_id).unwrap(), 0);

        let mut tx = store.begin().unwrap();
        tx.insert_entries(job_id, &[record]).unwrap();
        tx.commit().unwrap();
        assert_eq!(store.count_entries(job_id).unwrap(), 1);
    }

    #[test]
    fn test_update_unknown_job_fails() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut tx = store.begin().unwrap();
        let err = tx.update_job_stats(42, &JobStats::new()).unwrap_err();
        assert!(err.is_store_error());
    }
}
