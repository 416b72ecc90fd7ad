//! The interactive shell: a tokeniser plus a fixed command table.
//! Line assembly itself (draining the keyboard ring under `lock_intr`)
//! lives in [`crate::kernel`]'s main loop; this module only owns turning
//! an already-assembled line into a dispatched command.

use crate::config::{SHELL_MAX_ARGS, USERNAME};
use crate::error::KalioError;
use crate::vfs::{self, NodeKind};
use crate::{log, println};

const MAX_TOKENS: usize = SHELL_MAX_ARGS + 1; // + command name

/// Splits `line` on ASCII spaces, treating a double-quoted run as one
/// token (quotes are stripped). Returns the token count; unused slots in
/// `out` are left at `""`.
pub fn tokenize<'a>(line: &'a str, out: &mut [&'a str; MAX_TOKENS]) -> usize {
    let bytes = line.as_bytes();
    let mut count = 0;
    let mut i = 0;

    while i < bytes.len() && count < MAX_TOKENS {
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let start;
        let end;
        if bytes[i] == b'"' {
            i += 1;
            start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            end = i;
            if i < bytes.len() {
                i += 1;
            }
        } else {
            start = i;
            while i < bytes.len() && bytes[i] != b' ' {
                i += 1;
            }
            end = i;
        }

        out[count] = core::str::from_utf8(&bytes[start..end]).unwrap_or("");
        count += 1;
    }

    count
}

struct Command {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    help: &'static str,
    handler: fn(&[&str]),
}

const COMMANDS: [Command; 13] = [
    Command { name: "clear", min_args: 0, max_args: 0, help: "clear screen", handler: cmd_clear },
    Command { name: "whoami", min_args: 0, max_args: 0, help: "print current uid", handler: cmd_whoami },
    Command { name: "pwd", min_args: 0, max_args: 0, help: "print working dir", handler: cmd_pwd },
    Command { name: "mkdir", min_args: 1, max_args: SHELL_MAX_ARGS, help: "create dirs", handler: cmd_mkdir },
    Command { name: "rmdir", min_args: 1, max_args: SHELL_MAX_ARGS, help: "remove dirs", handler: cmd_rmdir },
    Command { name: "touch", min_args: 1, max_args: SHELL_MAX_ARGS, help: "create files", handler: cmd_touch },
    Command { name: "rm", min_args: 1, max_args: SHELL_MAX_ARGS, help: "remove dirs", handler: cmd_rm },
    Command { name: "cd", min_args: 1, max_args: 1, help: "move to directory", handler: cmd_cd },
    Command { name: "exit", min_args: 0, max_args: 0, help: "shutdown system", handler: cmd_exit },
    Command { name: "echo", min_args: 1, max_args: 1, help: "echo back the arg", handler: cmd_echo },
    Command { name: "write", min_args: 2, max_args: 2, help: "write to file", handler: cmd_write },
    Command { name: "cat", min_args: 1, max_args: 1, help: "read file", handler: cmd_cat },
    Command { name: "ls", min_args: 0, max_args: 0, help: "list children of cur node", handler: cmd_ls },
];

/// Tokenises `line` and runs the matching command, printing a one-line
/// diagnostic for an unknown command or an out-of-range argument count.
/// Blank lines are ignored.
pub fn dispatch(line: &str) {
    let mut tokens = [""; MAX_TOKENS];
    let count = tokenize(line, &mut tokens);
    if count == 0 {
        return;
    }

    let name = tokens[0];
    let args = &tokens[1..count];

    match COMMANDS.iter().find(|c| c.name == name) {
        None => log!(failed, "{}", KalioError::UnknownCommand),
        Some(cmd) => {
            if args.len() < cmd.min_args || args.len() > cmd.max_args {
                println!("HELP: {} [{}, {}] {}", cmd.name, cmd.min_args, cmd.max_args, cmd.help);
            } else {
                (cmd.handler)(args);
            }
        }
    }
}

fn cmd_clear(_args: &[&str]) {
    crate::drivers::vga::WRITER.lock().clear();
}

fn cmd_whoami(_args: &[&str]) {
    println!("{}", USERNAME);
}

fn cmd_pwd(_args: &[&str]) {
    let path = vfs::pwd_path(vfs::cur_dir());
    println!("{}", path.as_str());
}

fn cmd_mkdir(args: &[&str]) {
    for &name in args {
        if let Err(e) = vfs::create(vfs::cur_dir(), name, NodeKind::Dir) {
            log!(failed, "mkdir {}: {}", name, e);
        }
    }
}

fn cmd_rmdir(args: &[&str]) {
    for &name in args {
        if let Err(e) = vfs::rmdir(vfs::cur_dir(), name) {
            log!(failed, "rmdir {}: {}", name, e);
        }
    }
}

fn cmd_touch(args: &[&str]) {
    for &name in args {
        if let Err(e) = vfs::create(vfs::cur_dir(), name, NodeKind::File) {
            log!(failed, "touch {}: {}", name, e);
        }
    }
}

fn cmd_rm(args: &[&str]) {
    for &name in args {
        if let Err(e) = vfs::rm(vfs::cur_dir(), name) {
            log!(failed, "rm {}: {}", name, e);
        }
    }
}

fn cmd_cd(args: &[&str]) {
    if let Err(e) = vfs::cd(args[0]) {
        log!(failed, "cd {}: {}", args[0], e);
    }
}

fn cmd_exit(_args: &[&str]) {
    log!(warn, "shutting down");
    crate::hlt();
}

fn cmd_echo(args: &[&str]) {
    println!("{}", args[0]);
}

fn cmd_write(args: &[&str]) {
    let dir = vfs::cur_dir();
    let node = match vfs::find(dir, args[0]) {
        Some(n) => n,
        None => {
            log!(failed, "write {}: {}", args[0], KalioError::NotFound);
            return;
        }
    };
    if let Err(e) = vfs::open(node).or_else(|e| if e == KalioError::AlreadyOpen { Ok(()) } else { Err(e) }) {
        log!(failed, "write {}: {}", args[0], e);
        return;
    }
    if let Err(e) = vfs::write(node, args[1].as_bytes()) {
        log!(failed, "write {}: {}", args[0], e);
    }
}

fn cmd_cat(args: &[&str]) {
    let dir = vfs::cur_dir();
    let node = match vfs::find(dir, args[0]) {
        Some(n) => n,
        None => {
            log!(failed, "cat {}: {}", args[0], KalioError::NotFound);
            return;
        }
    };

    let len = vfs::file_len(node);
    let mut buf = [0u8; 256];
    let mut offset = 0;
    while offset < len {
        let n = vfs::read(node, &mut buf, offset);
        if n == 0 {
            break;
        }
        if let Ok(s) = core::str::from_utf8(&buf[..n]) {
            crate::print!("{}", s);
        }
        offset += n;
    }
    println!();
}

fn cmd_ls(_args: &[&str]) {
    let listing = vfs::ls(vfs::cur_dir());
    for (name, kind) in listing.iter() {
        match kind {
            NodeKind::Dir => println!("{}/", name),
            _ => println!("{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_spaces() {
        let mut out = [""; MAX_TOKENS];
        let n = tokenize("mkdir foo bar", &mut out);
        assert_eq!(n, 3);
        assert_eq!(&out[..n], &["mkdir", "foo", "bar"]);
    }

    #[test]
    fn honours_quoted_groups() {
        let mut out = [""; MAX_TOKENS];
        let n = tokenize(r#"echo "hello world""#, &mut out);
        assert_eq!(n, 2);
        assert_eq!(&out[..n], &["echo", "hello world"]);
    }

    #[test]
    fn collapses_repeated_spaces() {
        let mut out = [""; MAX_TOKENS];
        let n = tokenize("ls   ", &mut out);
        assert_eq!(n, 1);
        assert_eq!(out[0], "ls");
    }

    #[test]
    fn empty_line_yields_no_tokens() {
        let mut out = [""; MAX_TOKENS];
        let n = tokenize("", &mut out);
        assert_eq!(n, 0);
    }
}
