// mlsh: Mind-Loom Shell
// Build with: cargo build --bin mlsh

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use clap::{Arg, ArgAction, Command};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use mind_loom::persistence::settings::EditorSettings;
use mind_loom::persistence::store::FileGraphStore;
use mind_loom::session::notify::{NoticeKind, NoticeLog};
use mind_loom::session::{EditorSession, SessionError};
use mind_loom::shell::{self, ShellCommand};

type Session = EditorSession<FileGraphStore, Rc<NoticeLog>>;

fn print_notices(notices: &NoticeLog) {
    for (kind, msg) in notices.drain() {
        match kind {
            NoticeKind::Success => println!("[ok] {}", msg),
            NoticeKind::Error => eprintln!("[error] {}", msg),
        }
    }
}

/// Run one line; returns false when the shell should exit.
async fn run_line(session: &mut Session, notices: &NoticeLog, line: &str) -> bool {
    let cmd = match shell::parse_line(line) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => return true,
        Err(e) => {
            eprintln!("error: {}", e);
            return true;
        }
    };
    match cmd {
        ShellCommand::Quit => return false,
        ShellCommand::Help => println!("{}", shell::HELP),
        ShellCommand::List => println!("{}", shell::format_graph(session.graph())),
        ShellCommand::Key(chord) => match session.handle_shortcut(&chord).await {
            Some(outcome) => println!("{}", shell::describe_outcome(&outcome)),
            None => eprintln!("{} is not bound", chord),
        },
        ShellCommand::Import(path) => match std::fs::read_to_string(&path) {
            Ok(text) => {
                session.import_json(&text);
            }
            Err(e) => eprintln!("error: cannot read {}: {}", path.display(), e),
        },
        ShellCommand::Editor(cmd) => {
            let outcome = session.execute(cmd).await;
            println!("{}", shell::describe_outcome(&outcome));
        }
    }
    print_notices(notices);
    true
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let matches = Command::new("mlsh")
        .about("Mind-Loom Shell: edit a mind map stored on disk")
        .arg(Arg::new("graph").long("graph").short('g').default_value("default").help("Mind map id"))
        .arg(Arg::new("title").long("title").value_name("TITLE").help("Title for a new mind map"))
        .arg(Arg::new("store").long("store").value_name("DIR").help("Directory holding mind map files"))
        .arg(Arg::new("settings").long("settings").value_name("FILE").help("Settings JSON file"))
        .arg(Arg::new("eval").short('e').long("eval").value_name("COMMANDS").help("Run ';'-separated commands, save and exit"))
        .arg(Arg::new("quiet").short('q').long("quiet").action(ArgAction::SetTrue).help("Suppress banner/help text"))
        .get_matches();

    let settings = match matches.get_one::<String>("settings") {
        Some(p) => EditorSettings::load_from(std::path::Path::new(p)),
        None => EditorSettings::load(),
    };
    let settings = settings.unwrap_or_else(|e| {
        log::warn!("settings unreadable, using defaults: {}", e);
        EditorSettings::default()
    });
    let store_dir = matches
        .get_one::<String>("store")
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.store_dir());
    let graph_id = matches.get_one::<String>("graph").cloned().unwrap_or_else(|| "default".to_string());
    let title = matches.get_one::<String>("title").cloned().unwrap_or_else(|| graph_id.clone());
    let quiet = matches.get_flag("quiet");

    let notices = Rc::new(NoticeLog::new());
    let store = FileGraphStore::new(&store_dir);
    let mut session = match Session::open(store.clone(), notices.clone(), settings.clone(), graph_id.clone()).await {
        Ok(s) => s,
        Err(SessionError::NotFound(_)) => {
            // a fresh id starts a new map; drop the not-found notice
            notices.drain();
            Session::new(store, notices.clone(), settings, graph_id.clone(), title)
        }
        Err(e) => {
            print_notices(&notices);
            eprintln!("cannot open {}: {}", graph_id, e);
            std::process::exit(1);
        }
    };

    if let Some(script) = matches.get_one::<String>("eval") {
        for line in script.split(';') {
            if !run_line(&mut session, &notices, line).await {
                break;
            }
        }
        let ok = session.close().await;
        print_notices(&notices);
        std::process::exit(if ok { 0 } else { 1 });
    }

    if !quiet {
        println!("Mind-Loom shell on '{}' ({}). Type 'help' for commands.", graph_id, store_dir.display());
    }

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to start line editor: {}", e);
            std::process::exit(1);
        }
    };
    let history_path = EditorSettings::settings_path().with_file_name("mlsh_history.txt");
    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline("mlsh> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                let keep_going = run_line(&mut session, &notices, &line).await;
                // autosave deadlines are checked between commands
                if session.tick(Instant::now()).await {
                    log::debug!("auto-saved");
                }
                print_notices(&notices);
                if !keep_going {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }

    if let Some(dir) = history_path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let _ = rl.save_history(&history_path);
    if !session.close().await {
        eprintln!("warning: unsaved changes could not be written");
    }
    print_notices(&notices);
}
