//! Bot commands

/// Commands the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// `/start`: static greeting
    Start,
    /// `/getcurrentproblemsilo`: problems of the iLO group
    IloProblems,
    /// `/agent_problems`: problems of the agent groups
    AgentProblems,
}

impl BotCommand {
    /// Every command, in menu order
    pub const ALL: [BotCommand; 3] = [Self::Start, Self::IloProblems, Self::AgentProblems];

    /// Look up a command by name (without the leading slash)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "getcurrentproblemsilo" => Some(Self::IloProblems),
            "agent_problems" => Some(Self::AgentProblems),
            _ => None,
        }
    }

    /// Command name without the slash
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::IloProblems => "getcurrentproblemsilo",
            Self::AgentProblems => "agent_problems",
        }
    }

    /// Menu description
    pub fn description(self) -> &'static str {
        match self {
            Self::Start => "Show the greeting",
            Self::IloProblems => "Current iLO problems",
            Self::AgentProblems => "Current agent problems",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for command in BotCommand::ALL {
            assert_eq!(BotCommand::from_name(command.name()), Some(command));
        }
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(BotCommand::from_name("stop"), None);
        assert_eq!(BotCommand::from_name("Start"), None);
    }
}
