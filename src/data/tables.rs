pub const SCHEMA_VERSION: i32 = 1;

pub const MEMORY_SCHEMA_NAME: &str = "state";

pub const ATTACH_MEMORY: &str = "ATTACH ':memory:' AS state;";

pub const DETACH_MEMORY: &str = "DETACH DATABASE state;";

//Runs inside the migration transaction, which also bumps user_version
pub const FULL_SCHEMA: &str = "CREATE TABLE devices (
                                deviceid TEXT NOT NULL CHECK (length(deviceid) == 12),
                                PRIMARY KEY (deviceid)
                            ) WITHOUT ROWID;

                            CREATE TABLE outputs (
                                deviceid TEXT NOT NULL,
                                outputid INTEGER NOT NULL CHECK (0 <= outputid),
                                FOREIGN KEY (deviceid) REFERENCES devices(deviceid),
                                PRIMARY KEY (deviceid, outputid)
                            ) WITHOUT ROWID;

                            CREATE TABLE output_groups (
                                deviceid TEXT NOT NULL,
                                outputid INTEGER NOT NULL,
                                groupid INTEGER NOT NULL,
                                FOREIGN KEY (deviceid, outputid) REFERENCES outputs(deviceid, outputid),
                                PRIMARY KEY (deviceid, outputid, groupid)
                            ) WITHOUT ROWID;";

//No cross database foreign keys, so the checks are repeated here
pub const MEASURED_TABLE: &str = "CREATE TABLE state.measured (
                                deviceid TEXT NOT NULL CHECK (length(deviceid) == 12),
                                outputid INTEGER NOT NULL CHECK (0 <= outputid),
                                timestamp INTEGER NOT NULL DEFAULT (now_monotonic()),
                                state BOOLEAN NOT NULL,
                                level INTEGER,
                                PRIMARY KEY (deviceid, outputid)
                            ) WITHOUT ROWID;";

pub const SETPOINT_TABLE: &str = "CREATE TABLE state.setpoint (
                                deviceid TEXT NOT NULL CHECK (length(deviceid) == 12),
                                outputid INTEGER NOT NULL CHECK (0 <= outputid),
                                timestamp INTEGER NOT NULL DEFAULT (now_monotonic()),
                                setstate BOOLEAN NOT NULL,
                                setlevel INTEGER,
                                PRIMARY KEY (deviceid, outputid)
                            ) WITHOUT ROWID;";
