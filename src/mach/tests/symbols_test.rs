use super::*;

#[test]
fn test_lookup_walks_chain() {
    let global = SymbolTable::global();
    let program = SymbolTable::new("MAIN", &global);
    let call = SymbolTable::new("WORK", &program);
    global.insert_local("X", Value::Integer(1)).unwrap();
    assert_eq!(call.lookup("X"), Some(Value::Integer(1)));
    call.insert_local("X", Value::Integer(2)).unwrap();
    assert_eq!(call.lookup("X"), Some(Value::Integer(2)));
    assert_eq!(program.lookup("X"), Some(Value::Integer(1)));
    assert_eq!(call.lookup("Y"), None);
    assert!(global.is_global());
    assert_eq!(call.parent().map(|p| p.name()), Some("MAIN"));
}

#[test]
fn test_scopes() {
    let global = SymbolTable::global();
    let program = SymbolTable::new("MAIN", &global);
    let call = SymbolTable::new("WORK", &program);
    call.insert(Scope::Global, "G", Value::from("g")).unwrap();
    call.insert(Scope::Parent, "P", Value::Integer(5)).unwrap();
    call.insert(Scope::Local, "L", Value::Boolean(true)).unwrap();
    assert!(global.contains_local("G"));
    assert!(program.contains_local("P"));
    assert!(!call.contains_local("P"));
    assert_eq!(call.names(), vec!["L".to_string()]);
    global.insert(Scope::Parent, "Q", Value::Integer(1)).unwrap();
    assert!(global.contains_local("Q"));
}

#[test]
fn test_constants_are_read_only() {
    let global = SymbolTable::global();
    global.insert(Scope::Constant, "PI", Value::Double(3.14)).unwrap();
    let e = global.insert_local("PI", Value::Integer(3)).unwrap_err();
    assert_eq!(e.code(), ErrorCode::ReadOnly);
    assert!(global.is_readonly("PI"));
    assert_eq!(global.lookup("PI"), Some(Value::Double(3.14)));
}

#[test]
fn test_system_names() {
    let global = SymbolTable::global();
    let e = global.insert_local("$STATUS", Value::Integer(1)).unwrap_err();
    assert_eq!(e.code(), ErrorCode::ReadOnly);
    global.insert_system("$STATUS", Value::from("OOPS"));
    global.insert_system("$STATUS", Value::from("AGAIN"));
    assert_eq!(global.lookup("$STATUS"), Some(Value::from("AGAIN")));
    assert!(global.is_readonly("$STATUS"));
}

#[test]
fn test_common_entries() {
    let global = SymbolTable::global();
    let table = SymbolTable::new("MAIN", &global);
    table.insert(Scope::Common, "KEEP", Value::Integer(1)).unwrap();
    table.insert(Scope::Local, "DROP", Value::Integer(2)).unwrap();
    table.insert(Scope::Local, "KEEP", Value::Integer(3)).unwrap();
    assert_eq!(
        table.common_entries(),
        vec![("KEEP".to_string(), Value::Integer(3))]
    );
    assert_eq!(table.remove("DROP"), Some(Value::Integer(2)));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_common_entries_from_enclosing_tables() {
    let global = SymbolTable::global();
    let outer = SymbolTable::new("MAIN", &global);
    let inner = SymbolTable::new("SUB", &outer);
    outer.insert_common("A", Value::Integer(1)).unwrap();
    outer.insert_common("B", Value::Integer(2)).unwrap();
    outer.insert_common("C", Value::Integer(3)).unwrap();
    inner.insert_common("B", Value::Integer(20)).unwrap();
    inner.insert_local("C", Value::Integer(30)).unwrap();
    assert_eq!(
        inner.common_entries(),
        vec![
            ("A".to_string(), Value::Integer(1)),
            ("B".to_string(), Value::Integer(20)),
        ]
    );
}

#[test]
fn test_shared_between_threads() {
    let global = SymbolTable::global();
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let table = SymbolTable::new(format!("T{}", n), &global);
            std::thread::spawn(move || {
                table.insert_global(&format!("V{}", n), Value::Integer(n)).unwrap();
                table.insert_local("MINE", Value::Integer(n)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(global.len(), 4);
    assert_eq!(global.lookup("MINE"), None);
}
