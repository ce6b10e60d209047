// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证多连接并发分配/组成时的唯一性与原子性
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod concurrent_packaging_test {
    use bom_packaging::api::ApiError;
    use bom_packaging::app::AppState;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use crate::test_helpers::{create_test_db, ids, open_raw_conn, seed_drawing, seed_part};

    const WORKERS: usize = 4;

    /// 每个线程一个独立 AppState（独立连接），模拟多进程/多会话
    fn open_states(db_path: &str, n: usize) -> Vec<AppState> {
        (0..n)
            .map(|_| AppState::new(db_path.to_string()).unwrap())
            .collect()
    }

    #[test]
    fn test_concurrent_allocation_creates_single_unit_per_part() {
        bom_packaging::logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        let states = open_states(&db_path, WORKERS);

        seed_drawing(&states[0].catalog_repo, "PJ1", "D1");
        for i in 0..20 {
            seed_part(&states[0].catalog_repo, "D1", &format!("P{:02}", i), 2.0);
        }

        let barrier = Arc::new(Barrier::new(WORKERS));
        let inserted: Vec<usize> = thread::scope(|s| {
            let handles: Vec<_> = states
                .iter()
                .map(|state| {
                    let barrier = barrier.clone();
                    s.spawn(move || {
                        barrier.wait();
                        state
                            .packaging_api
                            .allocate_packaging_units("PJ1")
                            .unwrap()
                            .inserted_count
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(inserted.iter().sum::<usize>(), 20);

        let conn = open_raw_conn(&db_path);
        let (total, distinct): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT drawing_id || '/' || part_id) FROM packaging_unit",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(total, 20);
        assert_eq!(distinct, 20);
    }

    #[test]
    fn test_concurrent_compose_with_overlap_has_single_winner() {
        bom_packaging::logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        let states = open_states(&db_path, 2);

        seed_drawing(&states[0].catalog_repo, "PJ1", "D1");
        for part_id in ["P1", "P2", "P3"] {
            seed_part(&states[0].catalog_repo, "D1", part_id, 1.0);
        }
        states[0].packaging_api.allocate_packaging_units("PJ1").unwrap();

        let selections = [
            ids(&["KT-D1-P1", "KT-D1-P2"]),
            ids(&["KT-D1-P2", "KT-D1-P3"]),
        ];

        let barrier = Arc::new(Barrier::new(2));
        let results: Vec<Result<String, ApiError>> = thread::scope(|s| {
            let handles: Vec<_> = states
                .iter()
                .zip(selections.iter())
                .map(|(state, selection)| {
                    let barrier = barrier.clone();
                    s.spawn(move || {
                        barrier.wait();
                        state
                            .packaging_api
                            .compose_packaging_list(selection, "PJ1", None)
                            .map(|r| r.list_id)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&String> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ApiError::Conflict(_)))));

        // 胜者的单元全部归属同一清单；败者独占的单元保持未归属
        let conn = open_raw_conn(&db_path);
        let assigned: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM packaging_unit WHERE list_id = ?1",
                [winners[0]],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(assigned, 2);

        let lists: i64 = conn
            .query_row("SELECT COUNT(*) FROM packaging_list", [], |row| row.get(0))
            .unwrap();
        assert_eq!(lists, 1);

        let unassigned = states[0].packaging_api.list_unassigned_units("PJ1").unwrap();
        assert_eq!(unassigned.len(), 1);
    }

    #[test]
    fn test_shared_state_across_threads() {
        bom_packaging::logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path).unwrap();

        seed_drawing(&state.catalog_repo, "PJ1", "D1");
        for i in 0..WORKERS {
            seed_part(&state.catalog_repo, "D1", &format!("P{}", i), 1.0);
        }
        state.packaging_api.allocate_packaging_units("PJ1").unwrap();

        // 各线程组成互不相交的单元集合
        let list_ids: Vec<String> = thread::scope(|s| {
            let handles: Vec<_> = (0..WORKERS)
                .map(|i| {
                    let state = &state;
                    s.spawn(move || {
                        let unit_ids = vec![format!("KT-D1-P{}", i)];
                        state
                            .packaging_api
                            .compose_packaging_list(&unit_ids, "PJ1", None)
                            .unwrap()
                            .list_id
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(list_ids.len(), WORKERS);
        assert_eq!(
            state.packaging_api.list_packaging_lists("PJ1").unwrap().len(),
            WORKERS
        );
        assert!(state.packaging_api.list_unassigned_units("PJ1").unwrap().is_empty());
    }
}
