use auditum_domain::{GroupId, MembershipDirection, Right};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

/// Inspect the directory tree, memberships and permission-scoped targets.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Identity the query runs as.
#[derive(Args, Debug, Clone, Default)]
pub struct CallerArgs {
    /// Directory user id; omitted means an administrative caller.
    #[arg(long)]
    pub user: Option<String>,
    /// Role claims of the caller, comma separated, either naming form.
    #[arg(long, value_delimiter = ',')]
    pub roles: Vec<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    #[command(flatten)]
    Directory(DirectoryCommand),
    /// Print the resources a caller reaches with a right
    Scope {
        right: Right,
        #[command(flatten)]
        caller: CallerArgs,
    },
    /// Print the rights a caller holds on a resource
    Rights {
        resource: Uuid,
        #[command(flatten)]
        caller: CallerArgs,
    },
    /// Store a grant
    Grant {
        role: String,
        right: Right,
        resource: Uuid,
    },
    /// Remove a grant
    Revoke {
        role: String,
        right: Right,
        resource: Uuid,
    },
    /// Apply database migrations and exit
    Migrate,
}

/// Commands answered from the directory.
#[derive(Subcommand, Debug, Clone)]
pub enum DirectoryCommand {
    /// Print the flattened group tree
    Groups {
        /// Include hidden groups
        #[arg(long, default_value_t = false)]
        with_hidden: bool,
    },
    /// Print one group by id
    Group { id: String },
    /// Resolve a group path to its id
    GroupId { path: String },
    /// Print the ancestors of a group, nearest first
    Parents { group: GroupId },
    /// Print the direct children of a group
    Children { group: GroupId },
    /// Print the groups a user belongs to
    UserGroups {
        /// User id or username
        user: String,
        /// Membership expansion: none, up or down
        #[arg(long, default_value = "none")]
        direction: MembershipDirection,
        /// Keep only groups carrying one of these roles
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },
    /// Print a user and its direct group ids
    User { identifier: String },
    /// Search directory users
    Users { search: Option<String> },
    /// Print the users of a group as picker targets
    Members { group: GroupId },
    /// Print one realm role by id or name
    Role { identifier: String },
    /// Print every realm role
    Roles,
    /// Print the reduced target tree for a right
    Targets {
        right: Right,
        #[command(flatten)]
        caller: CallerArgs,
    },
}
