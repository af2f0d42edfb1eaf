use chrono::{Days, NaiveDate};
use flowctl_core::{StoreError, Task, TaskId, TaskStore};

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn is_sorted(dates: &[NaiveDate]) -> bool {
    dates.windows(2).all(|pair| pair[0] <= pair[1])
}

fn assert_tree_sorted(task: &Task) {
    let dates: Vec<NaiveDate> = task.children().iter().map(|child| child.due_date).collect();
    assert!(is_sorted(&dates), "children of {} out of order", task.title);
    for child in task.children() {
        assert_tree_sorted(child);
    }
}

fn assert_store_sorted(store: &TaskStore) {
    let roots: Vec<NaiveDate> = store.top_level().iter().map(|task| task.due_date).collect();
    assert!(is_sorted(&roots), "top level out of order");
    for root in store.top_level() {
        assert_tree_sorted(root);
    }
    let all: Vec<NaiveDate> = store
        .all_tasks()
        .into_iter()
        .map(|task| task.due_date)
        .collect();
    assert!(is_sorted(&all), "all_tasks out of order");
}

#[test]
fn mixed_insertions_keep_every_view_sorted() {
    let base = ymd(2024, 1, 1);
    let mut store = TaskStore::new();
    let mut ids: Vec<TaskId> = Vec::new();
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;

    for step in 0..200u64 {
        seed = seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let offset = (seed >> 33) % 60;
        let due = base.checked_add_days(Days::new(offset)).unwrap();
        let task = Task::new(format!("task-{step}"), due);

        let id = if ids.is_empty() || (seed >> 20) % 3 == 0 {
            store.insert_top_level(task)
        } else {
            let parent = ids[((seed >> 40) as usize) % ids.len()];
            store.attach_subtask(parent, task).unwrap()
        };
        ids.push(id);
        assert_store_sorted(&store);
    }

    assert_eq!(store.len(), 200);
    assert_eq!(store.all_tasks().len(), 200);
}

#[test]
fn equal_dates_place_newest_first_in_every_list() {
    let mut store = TaskStore::new();
    let a = store.insert_top_level(Task::new("a", ymd(2024, 3, 1)));
    let b = store.insert_top_level(Task::new("b", ymd(2024, 3, 1)));

    let roots: Vec<TaskId> = store.top_level().iter().map(|task| task.id()).collect();
    assert_eq!(roots, vec![b, a]);

    let c = store
        .attach_subtask(a, Task::new("c", ymd(2024, 2, 1)))
        .unwrap();
    let d = store
        .attach_subtask(a, Task::new("d", ymd(2024, 2, 1)))
        .unwrap();
    let children: Vec<TaskId> = store
        .find(a)
        .unwrap()
        .children()
        .iter()
        .map(|task| task.id())
        .collect();
    assert_eq!(children, vec![d, c]);

    let all: Vec<TaskId> = store.all_tasks().into_iter().map(|task| task.id()).collect();
    assert_eq!(all, vec![d, c, b, a]);
}

#[test]
fn all_tasks_orders_globally_regardless_of_depth() {
    let mut store = TaskStore::new();
    let late_root = store.insert_top_level(Task::new("late root", ymd(2024, 12, 1)));
    let early_root = store.insert_top_level(Task::new("early root", ymd(2024, 6, 1)));
    let deep = store
        .attach_subtask(late_root, Task::new("deep", ymd(2024, 1, 1)))
        .unwrap();
    let deeper = store
        .attach_subtask(deep, Task::new("deeper", ymd(2023, 12, 1)))
        .unwrap();

    let titles: Vec<&str> = store
        .all_tasks()
        .into_iter()
        .map(|task| task.title.as_str())
        .collect();
    assert_eq!(titles, vec!["deeper", "deep", "early root", "late root"]);
    assert_eq!(store.top_level()[0].id(), early_root);
    assert_eq!(store.find(deeper).unwrap().title, "deeper");
}

#[test]
fn insert_top_level_registers_only_the_root() {
    let mut store = TaskStore::new();
    let root = store.insert_top_level(Task::new("root", ymd(2024, 5, 1)));
    store
        .attach_subtask(root, Task::new("child", ymd(2024, 4, 1)))
        .unwrap();

    let copy = store.find(root).unwrap().duplicate();
    store.insert_top_level(copy);

    // The copied child was not registered.
    assert_eq!(store.len(), 3);
}

#[test]
fn insert_top_level_tree_registers_whole_subtree() {
    let mut store = TaskStore::new();
    let root = store.insert_top_level(Task::new("root", ymd(2024, 5, 1)));
    let child = store
        .attach_subtask(root, Task::new("child", ymd(2024, 4, 1)))
        .unwrap();
    store
        .attach_subtask(child, Task::new("grandchild", ymd(2024, 3, 1)))
        .unwrap();

    let copy = store.find(root).unwrap().duplicate();
    let copy_id = store.insert_top_level_tree(copy);

    assert_eq!(store.len(), 6);
    assert_eq!(store.top_level().len(), 2);
    assert!(store.find(copy_id).is_some());
    assert_store_sorted(&store);
}

#[test]
fn duplicated_tasks_keep_distinct_identities() {
    let mut store = TaskStore::new();
    let original = Task::new("a", ymd(2024, 5, 1));
    let mut copy = original.duplicate();
    copy.title = "b".to_string();
    let a = store.insert_top_level(original);
    let b = store.insert_top_level(copy);

    assert_ne!(a, b);
    let mut titles: Vec<&str> = store
        .all_tasks()
        .into_iter()
        .map(|task| task.title.as_str())
        .collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["a", "b"]);

    assert!(store.mark_complete(b).unwrap());
    assert!(store.find(b).unwrap().is_complete());
    assert!(!store.find(a).unwrap().is_complete());
}

#[test]
fn unknown_ids_are_reported() {
    let mut store = TaskStore::new();
    let outsider = Task::new("outsider", ymd(2024, 5, 1));

    let err = store
        .attach_subtask(outsider.id(), Task::new("child", ymd(2024, 5, 1)))
        .unwrap_err();
    assert_eq!(err, StoreError::ParentNotFound(outsider.id()));
    assert_eq!(
        store.mark_complete(outsider.id()),
        Err(StoreError::TaskNotFound(outsider.id()))
    );
    assert!(store.is_empty());
}
