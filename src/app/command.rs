// Console command parsing

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Help,
    SetTrigger(String),
    AddContact { name: String, phone_number: String },
    RemoveContact(String),
    Contacts,
    /// Cancel the alert currently in progress
    Cancel,
    Alerts,
    Quit,
    /// Plain text, fed to the listener as a recognized transcript chunk
    Transcript(String),
    /// A known command with missing arguments
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    pub const HELP: &'static str = "\
:trigger <phrase>        set the trigger phrase
:contact <name> <phone>  add an emergency contact
:remove <contact id>     remove a contact
:contacts                list contacts
:cancel                  cancel the alert in progress
:alerts                  show recent alerts
:quit                    exit
anything else is treated as recognized speech";

    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        let Some(command) = line.strip_prefix(':') else {
            return Command::Transcript(line.to_string());
        };

        let (name, args) = match command.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (command, ""),
        };

        match name {
            "help" => Command::Help,
            "trigger" if args.is_empty() => Command::Usage(":trigger <phrase>"),
            "trigger" => Command::SetTrigger(args.to_string()),
            "contact" => match args.rsplit_once(char::is_whitespace) {
                Some((name, phone)) if !name.trim().is_empty() => Command::AddContact {
                    name: name.trim().to_string(),
                    phone_number: phone.to_string(),
                },
                _ => Command::Usage(":contact <name> <phone>"),
            },
            "remove" if args.is_empty() => Command::Usage(":remove <contact id>"),
            "remove" => Command::RemoveContact(args.to_string()),
            "contacts" => Command::Contacts,
            "cancel" => Command::Cancel,
            "alerts" => Command::Alerts,
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
