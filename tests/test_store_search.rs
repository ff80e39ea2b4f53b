use env_logger;
use log::LevelFilter;
use tempfile::{tempdir, TempDir};

use mailsync_lib::{
    search,
    store::{Error, PendingCommandEntry},
    Attribute, ConditionsTreeNode, Flag, LocalStore, PendingCommand, SearchField, StoreConfig,
    StoreRegistry,
};

const FIXTURES: &str = "
    INSERT INTO folders (id, name, visible) VALUES (1, 'INBOX', 1);
    INSERT INTO folders (id, name, visible) VALUES (2, 'Archive', 0);

    INSERT INTO messages (id, folder_id, uid, subject, date, sender_list, text_content, read, flagged)
    VALUES (1, 1, '1', 'Lunch on friday', 100, 'alice@localhost', 'pizza or sushi', 1, 0);
    INSERT INTO messages (id, folder_id, uid, subject, date, sender_list, text_content, read, flagged)
    VALUES (2, 1, '2', 'Re: Lunch on friday', 200, 'bob@localhost', 'sushi please', 0, 1);
    INSERT INTO messages (id, folder_id, uid, subject, date, sender_list, text_content, read, flagged)
    VALUES (3, 2, '3', 'Quarterly report', 300, 'carol@localhost', 'numbers are up', 0, 0);
    INSERT INTO messages (id, folder_id, uid, subject, date, sender_list, text_content, read, flagged)
    VALUES (4, 1, '4', 'it''s 100% done; really', 400, 'dave@localhost', 'done', 1, 0);

    INSERT INTO threads (id, message_id) VALUES (1, 1);
    INSERT INTO threads (id, message_id, root, parent) VALUES (2, 2, 1, 1);
    INSERT INTO threads (id, message_id) VALUES (3, 3);
    INSERT INTO threads (id, message_id) VALUES (4, 4);
";

fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .try_init();
}

fn open_store(dir: &TempDir) -> LocalStore {
    let store = LocalStore::open(&StoreConfig::new(dir.path().join("store.db"))).unwrap();
    store.connection().execute_batch(FIXTURES).unwrap();
    store.rebuild_fulltext_index().unwrap();
    store
}

fn search_uids(store: &LocalStore, tree: &ConditionsTreeNode) -> Vec<String> {
    store
        .search_messages(Some(tree))
        .unwrap()
        .into_iter()
        .map(|message| message.uid)
        .collect()
}

#[test]
fn test_search_messages() {
    init_logger();

    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let lunch = ConditionsTreeNode::condition(SearchField::Subject, Attribute::Contains, "lunch");
    assert_eq!(search_uids(&store, &lunch), vec!["2", "1"]);

    let unread = ConditionsTreeNode::condition(SearchField::Read, Attribute::Equals, "0");
    assert_eq!(search_uids(&store, &unread), vec!["3", "2"]);
    assert_eq!(search_uids(&store, &lunch.clone().and(unread.clone())), vec!["2"]);
    assert_eq!(search_uids(&store, &lunch.clone().or(unread.clone())), vec!["3", "2", "1"]);
    assert_eq!(search_uids(&store, &unread.clone().not()), vec!["4", "1"]);

    let inbox = ConditionsTreeNode::condition(SearchField::Folder, Attribute::Equals, "1");
    assert_eq!(search_uids(&store, &inbox), vec!["4", "2", "1"]);

    let hidden = ConditionsTreeNode::condition(SearchField::Visible, Attribute::Equals, "0");
    assert_eq!(search_uids(&store, &hidden), vec!["3"]);

    let sender = ConditionsTreeNode::condition(SearchField::Sender, Attribute::NotEquals, "%@localhost");
    assert!(search_uids(&store, &sender).is_empty());

    let thread = ConditionsTreeNode::condition(SearchField::ThreadRoot, Attribute::Equals, "1");
    assert_eq!(search_uids(&store, &thread), vec!["2", "1"]);

    let message = store.search_messages(Some(&unread)).unwrap().remove(1);
    assert_eq!(message.subject, "Re: Lunch on friday");
    assert_eq!(message.folder, "INBOX");
    assert_eq!(message.thread_root, Some(1));
    assert!(message.flags.contains(&Flag::Flagged));
    assert!(!message.flags.contains(&Flag::Seen));
}

#[test]
fn test_search_fulltext() {
    init_logger();

    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let sushi = ConditionsTreeNode::condition(SearchField::MessageContents, Attribute::Contains, "sushi");
    assert_eq!(search_uids(&store, &sushi), vec!["2", "1"]);

    let archive = ConditionsTreeNode::condition(SearchField::Folder, Attribute::Equals, "2");
    let report = ConditionsTreeNode::condition(SearchField::MessageContents, Attribute::Contains, "numbers");
    assert_eq!(search_uids(&store, &report.and(archive)), vec!["3"]);

    let equals = ConditionsTreeNode::condition(SearchField::MessageContents, Attribute::Equals, "sushi");
    assert!(matches!(
        store.search_messages(Some(&equals)),
        Err(Error::SearchError(search::Error::InvalidFulltextAttribute(Attribute::Equals)))
    ));
}

#[test]
fn test_search_values_are_bound() {
    init_logger();

    let dir = tempdir().unwrap();
    let store = open_store(&dir);

    let tricky = ConditionsTreeNode::condition(SearchField::Subject, Attribute::Contains, "it's 100% done;");
    assert_eq!(search_uids(&store, &tricky), vec!["4"]);

    let injection = ConditionsTreeNode::condition(
        SearchField::Subject,
        Attribute::Equals,
        "x'; DROP TABLE messages; --",
    );
    assert!(search_uids(&store, &injection).is_empty());
    assert_eq!(store.search_messages(None).unwrap().len(), 4);
}

#[test]
fn test_pending_commands() {
    init_logger();

    let dir = tempdir().unwrap();
    let store = LocalStore::open(&StoreConfig::new(dir.path().join("store.db"))).unwrap();
    assert!(store.pending_commands().unwrap().is_empty());

    let set_flag = PendingCommand::set_flag("INBOX", false, Flag::Seen, ["1", "2"]).unwrap();
    let move_to_archive = PendingCommand::move_or_copy("INBOX", "Archive", false, ["3"]).unwrap();
    let set_flag_id = store.add_pending_command(&set_flag).unwrap();
    let move_id = store.add_pending_command(&move_to_archive).unwrap();

    assert_eq!(
        store.pending_commands().unwrap(),
        vec![
            PendingCommandEntry {
                id: set_flag_id,
                command: set_flag,
            },
            PendingCommandEntry {
                id: move_id,
                command: move_to_archive.clone(),
            },
        ]
    );

    store.remove_pending_command(set_flag_id).unwrap();
    drop(store);

    // pending commands survive a reopen
    let store = LocalStore::open(&StoreConfig::new(dir.path().join("store.db"))).unwrap();
    assert_eq!(
        store.pending_commands().unwrap(),
        vec![PendingCommandEntry {
            id: move_id,
            command: move_to_archive,
        }]
    );

    store.remove_pending_commands().unwrap();
    assert!(store.pending_commands().unwrap().is_empty());
}

#[test]
fn test_store_registry() {
    init_logger();

    let dir = tempdir().unwrap();
    let mut registry = StoreRegistry::new();

    let work = StoreConfig::new(dir.path().join("work.db"));
    let home = StoreConfig::new(dir.path().join("home.db"));

    registry
        .get_or_open("work", &work)
        .unwrap()
        .add_pending_command(&PendingCommand::expunge("INBOX").unwrap())
        .unwrap();
    registry.get_or_open("home", &home).unwrap();
    assert_eq!(registry.len(), 2);

    let store = registry.get_or_open("work", &work).unwrap();
    assert_eq!(store.pending_commands().unwrap().len(), 1);
    assert!(registry.get("home").unwrap().pending_commands().unwrap().is_empty());

    registry.close_all();
    assert!(registry.get("work").is_none());

    // the store can be opened again once closed
    let store = registry.get_or_open("work", &work).unwrap();
    assert_eq!(store.pending_commands().unwrap().len(), 1);
}
